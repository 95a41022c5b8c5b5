//! 测试用的内存 Keycloak

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::{AdminApi, AdminError, AdminSession, CredentialChangeRequest, TokenError};

/// 模拟 Keycloak
///
/// 成功修改凭据后出厂凭据随即失效，与真实服务一致
pub(crate) struct MockAdminApi {
    default_password_valid: AtomicBool,
    user_id: Option<String>,
    update_status: Option<u16>,
    token_delay: Duration,
    pub token_calls: AtomicUsize,
    pub updates: Mutex<Vec<(String, CredentialChangeRequest)>>,
}

impl MockAdminApi {
    /// 出厂凭据仍然有效，用户 `admin` 的 ID 为 `u-1`
    pub fn with_default_credentials() -> Self {
        Self {
            default_password_valid: AtomicBool::new(true),
            user_id: Some("u-1".to_string()),
            update_status: None,
            token_delay: Duration::ZERO,
            token_calls: AtomicUsize::new(0),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// 出厂凭据已失效
    pub fn already_secured() -> Self {
        let mock = Self::with_default_credentials();
        mock.rotate_credentials();
        mock
    }

    pub fn without_user(mut self) -> Self {
        self.user_id = None;
        self
    }

    pub fn rejecting_update(mut self, status: u16) -> Self {
        self.update_status = Some(status);
        self
    }

    /// 模拟响应缓慢的 token 端点
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// 模拟其他人修改了管理员密码
    pub fn rotate_credentials(&self) {
        self.default_password_valid.store(false, Ordering::SeqCst);
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl AdminApi for MockAdminApi {
    async fn get_admin_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminSession, TokenError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.token_delay).await;
        let valid = self.default_password_valid.load(Ordering::SeqCst);
        if valid && username == "admin" && password == "admin" {
            Ok(AdminSession::new("tok-1", username))
        } else {
            Err(TokenError::Rejected(401))
        }
    }

    async fn find_user_id(
        &self,
        _session: &AdminSession,
        username: &str,
    ) -> Result<String, AdminError> {
        self.user_id.clone().ok_or_else(|| AdminError::UserNotFound {
            username: username.to_string(),
        })
    }

    async fn apply_credential_change(
        &self,
        _session: &AdminSession,
        user_id: &str,
        request: &CredentialChangeRequest,
    ) -> Result<(), AdminError> {
        if let Some(status) = self.update_status {
            return Err(AdminError::UpdateRejected(status));
        }
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), request.clone()));
        self.rotate_credentials();
        Ok(())
    }
}
