//! 设置页面路由配置

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::handlers::{show_form, submit_form};
use super::service::SetupService;

/// 设置页面共享状态
#[derive(Clone)]
pub struct SetupState {
    pub service: Arc<SetupService>,
}

impl SetupState {
    pub fn new(service: Arc<SetupService>) -> Self {
        Self { service }
    }
}

/// 创建设置页面路由
///
/// # 端点
/// - `GET /` - 凭据表单
/// - `POST /` - 提交新凭据
///
/// 只监听本机地址，不做认证
pub fn create_setup_router(state: SetupState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
