//! 一次性设置页面
//!
//! 本地 HTTP 服务，展示凭据表单并在修改成功后自行关闭：
//! 1. `AwaitingInput` 阶段接受提交，提交时重新认证出厂凭据
//! 2. 修改成功后切换到 `Completed`（只发生一次）
//! 3. 关闭 future 等到 `Completed` 后再等待一小段时间，让成功页写回浏览器
//!
//! 关闭 future 与外部中断（Ctrl+C）竞争，`serve` 返回时连接已全部处理完毕。

mod handlers;
mod router;
mod service;
pub mod view;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::keycloak::AdminApi;
use crate::security::DefaultCredentials;

use router::{SetupState, create_setup_router};
use service::{SetupPhase, SetupService};

/// 设置页面结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// 凭据已修改
    Completed,
    /// 修改前被中断
    Interrupted,
}

/// 设置页面服务器
pub struct SetupServer {
    service: Arc<SetupService>,
    shutdown_delay: Duration,
}

impl SetupServer {
    pub fn new(
        admin: Arc<dyn AdminApi>,
        defaults: DefaultCredentials,
        shutdown_delay: Duration,
    ) -> Self {
        Self {
            service: Arc::new(SetupService::new(admin, defaults)),
            shutdown_delay,
        }
    }

    /// 在 listener 上提供服务，直到设置完成或 `interrupt` 结束
    pub async fn serve<F>(self, listener: TcpListener, interrupt: F) -> anyhow::Result<SetupOutcome>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("获取设置页面监听地址失败")?;
        tracing::info!("设置页面已启动: http://{}", addr);

        let phase_rx = self.service.subscribe();
        let delay = self.shutdown_delay;
        let shutdown = async move {
            tokio::select! {
                _ = shutdown_after_completion(phase_rx, delay) => {}
                _ = interrupt => tracing::info!("收到中断信号，关闭设置页面"),
            }
        };

        let app = create_setup_router(SetupState::new(self.service.clone()));
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("设置页面服务异常退出")?;

        let outcome = match self.service.phase() {
            SetupPhase::Completed => SetupOutcome::Completed,
            SetupPhase::AwaitingInput => SetupOutcome::Interrupted,
        };
        tracing::info!("设置页面已关闭: {:?}", outcome);
        Ok(outcome)
    }
}

/// 等待进入 `Completed`，再等待 `delay`
///
/// 被丢弃时等待随之取消
async fn shutdown_after_completion(mut phase_rx: watch::Receiver<SetupPhase>, delay: Duration) {
    if phase_rx
        .wait_for(|phase| *phase == SetupPhase::Completed)
        .await
        .is_err()
    {
        // 发送端只随服务一起释放，此时由中断结束
        std::future::pending::<()>().await;
    }
    tracing::info!("设置完成，{:?} 后关闭设置页面", delay);
    tokio::time::sleep(delay).await;
}
