//! 加固流程编排
//!
//! 启动隧道 → 检测出厂凭据 →（不安全时）打开设置页面 → 停止隧道。
//! 隧道在同一作用域内获取和释放，任何路径（包括错误）都只停止一次。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::browser;
use crate::http_client::build_client;
use crate::keycloak::{AdminApi, KeycloakClient};
use crate::model::config::Config;
use crate::security::{DefaultCredentials, SecurityChecker};
use crate::setup::{SetupOutcome, SetupServer};
use crate::tunnel::{DirectConnection, KubectlTunnel, TunnelManager, TunnelSpec};

/// 打开浏览器的函数
pub type BrowserOpener = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 出厂凭据已失效，无需设置
    AlreadySecure,
    /// 管理员凭据已更新
    CredentialsUpdated,
    /// 设置页面被中断
    Interrupted,
}

/// 设置页面参数
#[derive(Debug, Clone)]
pub struct SetupOptions {
    /// 监听地址，如 `127.0.0.1:5000`
    pub bind_addr: String,
    pub shutdown_delay: Duration,
    pub open_browser: bool,
}

/// 流程编排器
pub struct Orchestrator {
    tunnel: Arc<dyn TunnelManager>,
    tunnel_spec: TunnelSpec,
    admin: Arc<dyn AdminApi>,
    defaults: DefaultCredentials,
    setup: SetupOptions,
    browser: BrowserOpener,
}

impl Orchestrator {
    pub fn new(
        tunnel: Arc<dyn TunnelManager>,
        tunnel_spec: TunnelSpec,
        admin: Arc<dyn AdminApi>,
        defaults: DefaultCredentials,
        setup: SetupOptions,
    ) -> Self {
        Self {
            tunnel,
            tunnel_spec,
            admin,
            defaults,
            setup,
            browser: Arc::new(browser::open_url),
        }
    }

    /// 按配置组装 kubectl 隧道和 Keycloak 客户端
    ///
    /// `skip_tunnel` 为 true 时直接访问 `keycloakUrl`
    pub fn from_config(config: &Config, skip_tunnel: bool) -> anyhow::Result<Self> {
        let http = build_client(config.token_timeout()).context("构建 HTTP Client 失败")?;
        let admin = KeycloakClient::new(
            http,
            config.effective_keycloak_url(),
            &config.realm,
            &config.client_id,
        )
        .with_token_timeout(config.token_timeout());

        let tunnel: Arc<dyn TunnelManager> = if skip_tunnel {
            Arc::new(DirectConnection)
        } else {
            Arc::new(KubectlTunnel::new(
                &config.kubectl_path,
                config.tunnel_settle_delay(),
            ))
        };

        let tunnel_spec = TunnelSpec {
            namespace: config.namespace.clone(),
            service_name: config.service_name.clone(),
            local_port: config.local_port,
            remote_port: config.remote_port,
        };

        Ok(Self::new(
            tunnel,
            tunnel_spec,
            Arc::new(admin),
            DefaultCredentials::new(&config.initial_username, &config.initial_password),
            SetupOptions {
                bind_addr: config.setup_bind_addr(),
                shutdown_delay: config.shutdown_delay(),
                open_browser: config.open_browser,
            },
        ))
    }

    pub fn with_browser(mut self, browser: BrowserOpener) -> Self {
        self.browser = browser;
        self
    }

    /// 执行完整流程
    ///
    /// `interrupt` 在任何阶段结束都会让流程提前返回 `Interrupted`；
    /// 隧道一旦启动，总会在返回前停止一次
    pub async fn run<F>(&self, interrupt: F) -> anyhow::Result<RunOutcome>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (interrupt_tx, interrupt_rx) = watch::channel(false);
        let relay = tokio::spawn(async move {
            interrupt.await;
            let _ = interrupt_tx.send(true);
        });

        let result = self.run_until_interrupted(interrupt_rx).await;
        relay.abort();
        result
    }

    async fn run_until_interrupted(
        &self,
        interrupt: watch::Receiver<bool>,
    ) -> anyhow::Result<RunOutcome> {
        // 启动不可取消：已拉起的进程必须经过 stop
        let handle = self.tunnel.start(&self.tunnel_spec).await?;
        tracing::debug!(
            "隧道就绪: svc/{} pid={:?}",
            handle.spec().service_name,
            handle.pid()
        );
        let result = self.run_with_tunnel(interrupt).await;
        self.tunnel.stop(handle).await;
        result
    }

    async fn run_with_tunnel(
        &self,
        interrupt: watch::Receiver<bool>,
    ) -> anyhow::Result<RunOutcome> {
        if *interrupt.borrow() {
            tracing::info!("隧道建立期间收到中断信号");
            return Ok(RunOutcome::Interrupted);
        }

        let checker = SecurityChecker::new(self.admin.clone(), self.defaults.clone());
        let secure = tokio::select! {
            secure = checker.is_secure() => secure,
            _ = interrupted(interrupt.clone()) => {
                tracing::info!("安全检测期间收到中断信号");
                return Ok(RunOutcome::Interrupted);
            }
        };
        if secure {
            return Ok(RunOutcome::AlreadySecure);
        }

        let listener = TcpListener::bind(&self.setup.bind_addr)
            .await
            .with_context(|| format!("设置页面无法监听 {}", self.setup.bind_addr))?;
        let url = format!("http://{}", listener.local_addr()?);

        if self.setup.open_browser {
            tracing::info!("打开浏览器进行管理员设置: {}", url);
            if let Err(e) = (self.browser)(&url) {
                tracing::warn!("{}，请手动访问 {}", e, url);
            }
        } else {
            tracing::info!("请在浏览器中访问 {} 完成管理员设置", url);
        }

        let server = SetupServer::new(
            self.admin.clone(),
            self.defaults.clone(),
            self.setup.shutdown_delay,
        );
        let outcome = match server.serve(listener, interrupted(interrupt)).await? {
            SetupOutcome::Completed => RunOutcome::CredentialsUpdated,
            SetupOutcome::Interrupted => RunOutcome::Interrupted,
        };
        Ok(outcome)
    }
}

/// 等待中断标志置位；发送端被释放而未置位时永不返回
async fn interrupted(mut interrupt: watch::Receiver<bool>) {
    if interrupt.wait_for(|set| *set).await.is_err() {
        std::future::pending::<()>().await;
    }
}
