//! 出厂凭据检测

use std::sync::Arc;

use crate::keycloak::AdminApi;

/// 出厂管理员凭据
#[derive(Clone)]
pub struct DefaultCredentials {
    pub username: String,
    pub password: String,
}

impl DefaultCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// 安全检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityStatus {
    /// 出厂凭据已失效
    Secure,
    /// 出厂凭据仍可登录
    DefaultCredentialsActive,
}

/// 出厂凭据检测器
///
/// 单次探测，不重试。网络故障与凭据失效无法区分，两者都判定为安全。
pub struct SecurityChecker {
    admin: Arc<dyn AdminApi>,
    defaults: DefaultCredentials,
}

impl SecurityChecker {
    pub fn new(admin: Arc<dyn AdminApi>, defaults: DefaultCredentials) -> Self {
        Self { admin, defaults }
    }

    /// 用出厂凭据尝试获取 Token，每次调用都重新探测
    pub async fn check(&self) -> SecurityStatus {
        tracing::info!("检查 Keycloak 安全状态...");
        match self
            .admin
            .get_admin_token(&self.defaults.username, &self.defaults.password)
            .await
        {
            Ok(_) => {
                tracing::warn!(
                    "出厂凭据 ({}) 仍然有效，启动安全设置流程",
                    self.defaults.username
                );
                SecurityStatus::DefaultCredentialsActive
            }
            Err(e) => {
                tracing::debug!("出厂凭据探测未获得 Token: {}", e);
                tracing::info!("出厂凭据已失效，Keycloak 处于安全状态");
                SecurityStatus::Secure
            }
        }
    }

    pub async fn is_secure(&self) -> bool {
        self.check().await == SecurityStatus::Secure
    }
}
