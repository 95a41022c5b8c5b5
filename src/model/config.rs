use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 自动加固工具配置
///
/// 所有字段均可省略，缺省值对应集群内 Keycloak 的出厂部署
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Keycloak 所在命名空间
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Keycloak Service 名称
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// 本地转发端口
    #[serde(default = "default_local_port")]
    pub local_port: u16,

    /// Service 端口
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,

    #[serde(default = "default_kubectl_path")]
    pub kubectl_path: String,

    /// Keycloak 地址（可选），未配置时使用 http://localhost:{localPort}
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_url: Option<String>,

    #[serde(default = "default_realm")]
    pub realm: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// 出厂管理员用户名
    #[serde(default = "default_initial_username")]
    pub initial_username: String,

    /// 出厂管理员密码
    #[serde(default = "default_initial_password")]
    pub initial_password: String,

    /// 设置页面监听地址
    #[serde(default = "default_setup_host")]
    pub setup_host: String,

    /// 设置页面监听端口
    #[serde(default = "default_setup_port")]
    pub setup_port: u16,

    /// Token 请求超时（秒）
    #[serde(default = "default_token_timeout_secs")]
    pub token_timeout_secs: u64,

    /// 端口转发建立等待时间（秒）
    #[serde(default = "default_tunnel_settle_secs")]
    pub tunnel_settle_secs: u64,

    /// 设置完成后到退出的延迟（秒），留给响应写回浏览器
    #[serde(default = "default_shutdown_delay_secs")]
    pub shutdown_delay_secs: u64,

    /// 是否自动打开浏览器
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_namespace() -> String {
    "keycloak".to_string()
}

fn default_service_name() -> String {
    "keycloak".to_string()
}

fn default_local_port() -> u16 {
    8080
}

fn default_remote_port() -> u16 {
    8080
}

fn default_kubectl_path() -> String {
    "kubectl".to_string()
}

fn default_realm() -> String {
    "master".to_string()
}

fn default_client_id() -> String {
    "admin-cli".to_string()
}

fn default_initial_username() -> String {
    "admin".to_string()
}

fn default_initial_password() -> String {
    "admin".to_string()
}

fn default_setup_host() -> String {
    "127.0.0.1".to_string()
}

fn default_setup_port() -> u16 {
    5000
}

fn default_token_timeout_secs() -> u64 {
    5
}

fn default_tunnel_settle_secs() -> u64 {
    3
}

fn default_shutdown_delay_secs() -> u64 {
    1
}

fn default_open_browser() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            service_name: default_service_name(),
            local_port: default_local_port(),
            remote_port: default_remote_port(),
            kubectl_path: default_kubectl_path(),
            keycloak_url: None,
            realm: default_realm(),
            client_id: default_client_id(),
            initial_username: default_initial_username(),
            initial_password: default_initial_password(),
            setup_host: default_setup_host(),
            setup_port: default_setup_port(),
            token_timeout_secs: default_token_timeout_secs(),
            tunnel_settle_secs: default_tunnel_settle_secs(),
            shutdown_delay_secs: default_shutdown_delay_secs(),
            open_browser: default_open_browser(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置，文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 获取有效的 Keycloak 地址
    /// 优先使用 keycloak_url，未配置时回退到本地转发端口
    pub fn effective_keycloak_url(&self) -> String {
        match self.keycloak_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.local_port),
        }
    }

    /// 设置页面监听地址
    pub fn setup_bind_addr(&self) -> String {
        format!("{}:{}", self.setup_host, self.setup_port)
    }

    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }

    pub fn tunnel_settle_delay(&self) -> Duration {
        Duration::from_secs(self.tunnel_settle_secs)
    }

    pub fn shutdown_delay(&self) -> Duration {
        Duration::from_secs(self.shutdown_delay_secs)
    }
}
