//! 设置页面业务逻辑

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::keycloak::{AdminApi, AdminError, AdminSession, CredentialChangeRequest};
use crate::security::DefaultCredentials;

use super::view::SetupView;

/// 重新认证失败时展示的文案
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired or already changed.";

/// 设置流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    AwaitingInput,
    /// 终态，只会进入一次
    Completed,
}

/// 设置服务
///
/// 提交按顺序处理；阶段通过 watch channel 广播给关闭逻辑
pub struct SetupService {
    admin: Arc<dyn AdminApi>,
    defaults: DefaultCredentials,
    phase: watch::Sender<SetupPhase>,
    submit_lock: Mutex<()>,
}

impl SetupService {
    pub fn new(admin: Arc<dyn AdminApi>, defaults: DefaultCredentials) -> Self {
        let (phase, _) = watch::channel(SetupPhase::AwaitingInput);
        Self {
            admin,
            defaults,
            phase,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn phase(&self) -> SetupPhase {
        *self.phase.borrow()
    }

    /// 订阅阶段变化
    pub fn subscribe(&self) -> watch::Receiver<SetupPhase> {
        self.phase.subscribe()
    }

    /// GET 时展示的页面
    pub fn current_view(&self) -> SetupView {
        match self.phase() {
            SetupPhase::AwaitingInput => SetupView::form(&self.defaults.username),
            SetupPhase::Completed => SetupView::Completed,
        }
    }

    /// 切换到 Completed
    ///
    /// 只有第一次调用返回 true，关闭流程只由这一次切换触发
    pub fn complete(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase == SetupPhase::AwaitingInput {
                *phase = SetupPhase::Completed;
                true
            } else {
                false
            }
        })
    }

    /// 处理表单提交
    pub async fn submit(&self, request: CredentialChangeRequest) -> SetupView {
        let _guard = self.submit_lock.lock().await;

        if self.phase() == SetupPhase::Completed {
            tracing::debug!("设置已完成，忽略重复提交");
            return SetupView::Completed;
        }

        // 不复用启动时的检测结果，期间密码可能已被他人修改
        let session = match self
            .admin
            .get_admin_token(&self.defaults.username, &self.defaults.password)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("出厂凭据重新认证失败: {}", e);
                return SetupView::form_with_error(SESSION_EXPIRED_MESSAGE, request.username);
            }
        };

        match self.apply(&session, &request).await {
            Ok(()) => {
                if self.complete() {
                    tracing::info!("管理员凭据已更新，新用户名: {}", request.username);
                }
                SetupView::Completed
            }
            Err(e) => {
                tracing::warn!("管理员凭据更新失败: {}", e);
                SetupView::form_with_error(e.user_message(), request.username)
            }
        }
    }

    async fn apply(
        &self,
        session: &AdminSession,
        request: &CredentialChangeRequest,
    ) -> Result<(), AdminError> {
        let user_id = self
            .admin
            .find_user_id(session, &self.defaults.username)
            .await?;
        self.admin
            .apply_credential_change(session, &user_id, request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::keycloak::mock::MockAdminApi;

    fn service(admin: Arc<MockAdminApi>) -> SetupService {
        SetupService::new(admin, DefaultCredentials::new("admin", "admin"))
    }

    fn ops_request() -> CredentialChangeRequest {
        CredentialChangeRequest {
            username: "ops".to_string(),
            password: "S3cure!".to_string(),
        }
    }

    #[test]
    fn test_initial_view_prefills_default_username() {
        let service = service(Arc::new(MockAdminApi::with_default_credentials()));

        assert_eq!(service.phase(), SetupPhase::AwaitingInput);
        assert_eq!(service.current_view(), SetupView::form("admin"));
    }

    #[tokio::test]
    async fn test_successful_submission_completes() {
        let admin = Arc::new(MockAdminApi::with_default_credentials());
        let service = service(admin.clone());
        let mut phase_rx = service.subscribe();

        let view = service.submit(ops_request()).await;

        assert_eq!(view, SetupView::Completed);
        assert_eq!(service.phase(), SetupPhase::Completed);
        assert!(phase_rx.has_changed().unwrap());
        assert_eq!(*phase_rx.borrow_and_update(), SetupPhase::Completed);

        let updates = admin.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "u-1");
        assert_eq!(updates[0].1.username, "ops");
        assert_eq!(updates[0].1.password, "S3cure!");
    }

    #[tokio::test]
    async fn test_reauth_failure_after_rotation() {
        let admin = Arc::new(MockAdminApi::with_default_credentials());
        let service = service(admin.clone());

        // 检测之后、提交之前，密码被其他人修改
        admin.rotate_credentials();
        let view = service.submit(ops_request()).await;

        assert_eq!(
            view,
            SetupView::form_with_error(SESSION_EXPIRED_MESSAGE, "ops")
        );
        assert_eq!(service.phase(), SetupPhase::AwaitingInput);
        assert_eq!(admin.update_count(), 0);
    }

    #[tokio::test]
    async fn test_user_not_found_is_recoverable() {
        let admin = Arc::new(MockAdminApi::with_default_credentials().without_user());
        let service = service(admin.clone());

        let view = service.submit(ops_request()).await;

        assert_eq!(
            view,
            SetupView::form_with_error("The administrator account could not be found.", "ops")
        );
        assert_eq!(service.phase(), SetupPhase::AwaitingInput);
    }

    #[tokio::test]
    async fn test_update_rejected_is_generic_and_recoverable() {
        let admin = Arc::new(MockAdminApi::with_default_credentials().rejecting_update(400));
        let service = service(admin.clone());

        let view = service.submit(ops_request()).await;

        assert_eq!(
            view,
            SetupView::form_with_error("Failed to update the administrator account.", "ops")
        );
        assert_eq!(service.phase(), SetupPhase::AwaitingInput);
        assert_eq!(service.current_view(), SetupView::form("admin"));
    }

    #[tokio::test]
    async fn test_resubmission_after_completion_applies_nothing() {
        let admin = Arc::new(MockAdminApi::with_default_credentials());
        let service = service(admin.clone());

        assert_eq!(service.submit(ops_request()).await, SetupView::Completed);
        let token_calls = admin.token_calls.load(std::sync::atomic::Ordering::SeqCst);

        assert_eq!(service.submit(ops_request()).await, SetupView::Completed);
        assert_eq!(admin.update_count(), 1);
        assert_eq!(
            admin.token_calls.load(std::sync::atomic::Ordering::SeqCst),
            token_calls
        );
        assert_eq!(service.current_view(), SetupView::Completed);
    }

    #[test]
    fn test_complete_transitions_once() {
        let service = service(Arc::new(MockAdminApi::with_default_credentials()));

        assert!(service.complete());
        assert!(!service.complete());
        assert_eq!(service.phase(), SetupPhase::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_apply_once() {
        let admin = Arc::new(MockAdminApi::with_default_credentials());
        let service = Arc::new(service(admin.clone()));

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.submit(ops_request()).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.submit(ops_request()).await }
        });

        assert_eq!(a.await.unwrap(), SetupView::Completed);
        assert_eq!(b.await.unwrap(), SetupView::Completed);
        assert_eq!(admin.update_count(), 1);
    }
}
