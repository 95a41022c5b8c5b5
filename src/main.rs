mod browser;
mod http_client;
mod keycloak;
mod model;
mod orchestrator;
mod security;
mod setup;
mod tunnel;

use clap::Parser;

use model::config::Config;
use orchestrator::{Orchestrator, RunOutcome};

/// Keycloak 首次运行加固工具
///
/// 检测出厂管理员凭据是否仍然有效，若有效则打开本地设置页面修改。
#[derive(Parser, Debug)]
#[command(name = "keycloak-auto-secure", version, about)]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// Keycloak 所在命名空间
    #[arg(long)]
    namespace: Option<String>,

    /// Keycloak Service 名称
    #[arg(long)]
    service: Option<String>,

    /// 本地转发端口
    #[arg(long)]
    local_port: Option<u16>,

    /// 设置页面端口
    #[arg(long)]
    setup_port: Option<u16>,

    /// 不自动打开浏览器
    #[arg(long)]
    no_browser: bool,

    /// 不建立端口转发，直接访问 keycloakUrl
    #[arg(long)]
    skip_tunnel: bool,
}

impl Args {
    /// 命令行参数覆盖配置文件
    fn apply_to(&self, config: &mut Config) {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(service) = &self.service {
            config.service_name = service.clone();
        }
        if let Some(port) = self.local_port {
            config.local_port = port;
        }
        if let Some(port) = self.setup_port {
            config.setup_port = port;
        }
        if self.no_browser {
            config.open_browser = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path).map_err(|e| {
        tracing::error!("加载配置失败: {}", e);
        e
    })?;
    args.apply_to(&mut config);
    tracing::debug!("Keycloak 地址: {}", config.effective_keycloak_url());

    let orchestrator = Orchestrator::from_config(&config, args.skip_tunnel)?;
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("无法监听 Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match orchestrator.run(interrupt).await? {
        RunOutcome::AlreadySecure => tracing::info!("Keycloak 已处于安全状态，无需设置"),
        RunOutcome::CredentialsUpdated => tracing::info!("管理员凭据设置完成"),
        RunOutcome::Interrupted => tracing::warn!("设置被中断，出厂凭据仍然有效"),
    }

    Ok(())
}
