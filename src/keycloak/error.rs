//! Keycloak 调用错误类型

use std::fmt;

/// 获取管理员 Token 失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Keycloak 拒绝了凭据（非 200）
    Rejected(u16),
    /// 网络错误或超时
    Transport(String),
    /// 响应无法解析
    InvalidResponse(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Rejected(status) => write!(f, "Token 请求被拒绝: HTTP {}", status),
            TokenError::Transport(msg) => write!(f, "Token 请求失败: {}", msg),
            TokenError::InvalidResponse(msg) => write!(f, "Token 响应无效: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// 用户管理调用错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// 按用户名查询结果为空
    UserNotFound { username: String },
    /// 用户更新未返回 204
    UpdateRejected(u16),
    /// 用户查询返回非成功状态
    LookupFailed(u16),
    /// 网络错误或响应无法解析
    Transport(String),
}

impl AdminError {
    /// 展示给操作者的文案，不包含 Keycloak 返回的细节
    pub fn user_message(&self) -> &'static str {
        match self {
            AdminError::UserNotFound { .. } => "The administrator account could not be found.",
            AdminError::UpdateRejected(_) | AdminError::LookupFailed(_) => {
                "Failed to update the administrator account."
            }
            AdminError::Transport(_) => "Could not reach Keycloak. Please try again.",
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::UserNotFound { username } => write!(f, "用户不存在: {}", username),
            AdminError::UpdateRejected(status) => write!(f, "用户更新失败: HTTP {}", status),
            AdminError::LookupFailed(status) => write!(f, "用户查询失败: HTTP {}", status),
            AdminError::Transport(msg) => write!(f, "Keycloak 请求失败: {}", msg),
        }
    }
}

impl std::error::Error for AdminError {}

impl From<reqwest::Error> for AdminError {
    fn from(e: reqwest::Error) -> Self {
        AdminError::Transport(e.to_string())
    }
}
