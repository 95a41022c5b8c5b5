//! Keycloak Admin 模块
//!
//! 封装 Token 签发和用户管理两组 REST 端点：
//! - 以 password grant 获取管理员 Token
//! - 按用户名查询用户 ID
//! - 更新用户名并替换密码凭据

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use client::KeycloakClient;
pub use error::{AdminError, TokenError};
pub use types::{AdminSession, CredentialChangeRequest};

/// Keycloak 管理接口
///
/// 每次操作都由调用方重新认证，实现不缓存 Token
#[async_trait::async_trait]
pub trait AdminApi: Send + Sync {
    /// 以用户名密码获取管理员 Token
    async fn get_admin_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminSession, TokenError>;

    /// 按用户名查询用户 ID（取第一条结果）
    async fn find_user_id(
        &self,
        session: &AdminSession,
        username: &str,
    ) -> Result<String, AdminError>;

    /// 更新用户名并以永久密码替换凭据
    async fn apply_credential_change(
        &self,
        session: &AdminSession,
        user_id: &str,
        request: &CredentialChangeRequest,
    ) -> Result<(), AdminError>;
}
