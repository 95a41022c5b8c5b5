//! Keycloak REST 类型定义

use serde::{Deserialize, Serialize};

/// 管理员会话（Bearer Token + 签发对象）
#[derive(Clone)]
pub struct AdminSession {
    pub access_token: String,
    pub username: String,
}

impl AdminSession {
    pub fn new(access_token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            username: username.into(),
        }
    }
}

// token 不进入日志
impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("username", &self.username)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// 新的管理员用户名和密码
///
/// 字段缺失时反序列化为空字符串，非空校验由表单的 `required` 负责
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialChangeRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialChangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialChangeRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// password grant 表单
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrantForm<'a> {
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub grant_type: &'a str,
}

/// Token 端点响应（只取需要的字段）
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// 用户查询结果中的单条记录
#[derive(Debug, Deserialize)]
pub(crate) struct UserRepresentation {
    pub id: String,
}

/// 用户更新请求体
#[derive(Serialize)]
pub(crate) struct UserUpdate<'a> {
    pub username: &'a str,
    pub credentials: Vec<CredentialRepresentation<'a>>,
}

#[derive(Serialize)]
pub(crate) struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    pub credential_type: &'a str,
    pub value: &'a str,
    pub temporary: bool,
}

impl<'a> UserUpdate<'a> {
    /// 替换用户名并以单条永久密码替换凭据集合
    pub fn from_request(request: &'a CredentialChangeRequest) -> Self {
        Self {
            username: &request.username,
            credentials: vec![CredentialRepresentation {
                credential_type: "password",
                value: &request.password,
                temporary: false,
            }],
        }
    }
}
