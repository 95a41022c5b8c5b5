//! 设置页面 HTTP 处理器

use axum::{Form, extract::State, response::Html};

use crate::keycloak::CredentialChangeRequest;

use super::router::SetupState;
use super::view::render;

/// GET /
/// 展示凭据表单（已完成时展示成功页）
pub async fn show_form(State(state): State<SetupState>) -> Html<String> {
    Html(render(&state.service.current_view()))
}

/// POST /
/// 提交新的用户名和密码
pub async fn submit_form(
    State(state): State<SetupState>,
    Form(request): Form<CredentialChangeRequest>,
) -> Html<String> {
    let view = state.service.submit(request).await;
    Html(render(&view))
}
