//! Keycloak REST 客户端

use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::error::{AdminError, TokenError};
use super::types::{
    AdminSession, CredentialChangeRequest, PasswordGrantForm, TokenResponse, UserRepresentation,
    UserUpdate,
};
use super::AdminApi;

/// 错误响应写入日志时保留的最大字符数
const MAX_LOGGED_BODY_CHARS: usize = 200;

/// token 请求默认超时
const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Keycloak REST 客户端
pub struct KeycloakClient {
    client: Client,
    base_url: String,
    realm: String,
    client_id: String,
    token_timeout: Duration,
}

impl KeycloakClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            realm: realm.into(),
            client_id: client_id.into(),
            token_timeout: DEFAULT_TOKEN_TIMEOUT,
        }
    }

    /// 设置 token 请求超时（只作用于 token 端点）
    pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    /// POST /realms/{realm}/protocol/openid-connect/token
    fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url,
            urlencoding::encode(&self.realm)
        )
    }

    /// /admin/realms/{realm}/users
    fn users_url(&self) -> String {
        format!(
            "{}/admin/realms/{}/users",
            self.base_url,
            urlencoding::encode(&self.realm)
        )
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.users_url(), urlencoding::encode(user_id))
    }
}

#[async_trait::async_trait]
impl AdminApi for KeycloakClient {
    async fn get_admin_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminSession, TokenError> {
        let form = PasswordGrantForm {
            client_id: &self.client_id,
            username,
            password,
            grant_type: "password",
        };

        let resp = self
            .client
            .post(self.token_url())
            .timeout(self.token_timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(TokenError::Rejected(status.as_u16()));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        Ok(AdminSession::new(body.access_token, username))
    }

    async fn find_user_id(
        &self,
        session: &AdminSession,
        username: &str,
    ) -> Result<String, AdminError> {
        let resp = self
            .client
            .get(self.users_url())
            .bearer_auth(&session.access_token)
            .query(&[("username", username)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdminError::LookupFailed(status.as_u16()));
        }

        let users: Vec<UserRepresentation> = resp.json().await?;
        users
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or_else(|| AdminError::UserNotFound {
                username: username.to_string(),
            })
    }

    async fn apply_credential_change(
        &self,
        session: &AdminSession,
        user_id: &str,
        request: &CredentialChangeRequest,
    ) -> Result<(), AdminError> {
        let resp = self
            .client
            .put(self.user_url(user_id))
            .bearer_auth(&session.access_token)
            .json(&UserUpdate::from_request(request))
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::NO_CONTENT {
            let detail: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_LOGGED_BODY_CHARS)
                .collect();
            tracing::warn!("Keycloak 用户更新返回 HTTP {}: {}", status, detail);
            return Err(AdminError::UpdateRejected(status.as_u16()));
        }

        Ok(())
    }
}
