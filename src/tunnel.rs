//! 端口转发隧道管理
//!
//! 通过 `kubectl port-forward` 把集群内的 Keycloak Service 映射到本地端口。
//! 隧道进程句柄由调用方显式持有，`stop` 消费句柄。

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

/// 停止隧道时等待进程退出的宽限时间
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// 隧道目标描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSpec {
    pub namespace: String,
    pub service_name: String,
    pub local_port: u16,
    pub remote_port: u16,
}

impl TunnelSpec {
    /// `kubectl` 命令参数
    fn kubectl_args(&self) -> Vec<String> {
        vec![
            "port-forward".to_string(),
            "-n".to_string(),
            self.namespace.clone(),
            format!("svc/{}", self.service_name),
            format!("{}:{}", self.local_port, self.remote_port),
        ]
    }

    /// 用于匹配残留转发进程的 `pkill -f` 模式
    fn stale_process_pattern(&self) -> String {
        format!("port-forward.*{}", self.service_name)
    }
}

/// 运行中的隧道
///
/// 子进程以 `kill_on_drop` 启动，未经 `stop` 就被丢弃时也会被强制结束
#[derive(Debug)]
pub struct TunnelHandle {
    spec: TunnelSpec,
    child: Option<Child>,
}

impl TunnelHandle {
    /// 不关联任何进程的句柄（直连模式）
    pub fn detached(spec: TunnelSpec) -> Self {
        Self { spec, child: None }
    }

    pub fn spec(&self) -> &TunnelSpec {
        &self.spec
    }

    /// 隧道进程 PID（直连模式或进程已被回收时为 None）
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }
}

/// 隧道错误
#[derive(Debug)]
pub enum TunnelError {
    /// 无法启动隧道进程
    Spawn(String),
    /// 隧道进程在建立期间退出
    Exited(String),
}

impl fmt::Display for TunnelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelError::Spawn(msg) => write!(f, "无法启动端口转发: {}", msg),
            TunnelError::Exited(status) => write!(f, "端口转发进程提前退出: {}", status),
        }
    }
}

impl std::error::Error for TunnelError {}

/// 隧道管理 trait
#[async_trait::async_trait]
pub trait TunnelManager: Send + Sync {
    /// 启动隧道，返回前已等待隧道建立
    async fn start(&self, spec: &TunnelSpec) -> Result<TunnelHandle, TunnelError>;

    /// 停止隧道，不返回错误
    async fn stop(&self, handle: TunnelHandle);
}

/// 基于 `kubectl port-forward` 的隧道
pub struct KubectlTunnel {
    kubectl: String,
    settle_delay: Duration,
}

impl KubectlTunnel {
    pub fn new(kubectl: impl Into<String>, settle_delay: Duration) -> Self {
        Self {
            kubectl: kubectl.into(),
            settle_delay,
        }
    }

    /// 结束同一 Service 的残留转发进程（尽力而为）
    async fn kill_stale(&self, spec: &TunnelSpec) {
        let pattern = spec.stale_process_pattern();
        let status = Command::new("pkill")
            .args(["-f", pattern.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                tracing::info!("已清理残留的端口转发进程: {}", pattern)
            }
            Ok(_) => tracing::debug!("没有残留的端口转发进程: {}", pattern),
            Err(e) => tracing::debug!("pkill 不可用，跳过清理: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl TunnelManager for KubectlTunnel {
    async fn start(&self, spec: &TunnelSpec) -> Result<TunnelHandle, TunnelError> {
        tracing::info!(
            "端口转发 svc/{} ({}) -> localhost:{}",
            spec.service_name,
            spec.namespace,
            spec.local_port
        );
        self.kill_stale(spec).await;

        let mut child = Command::new(&self.kubectl)
            .args(spec.kubectl_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TunnelError::Spawn(format!("{}: {}", self.kubectl, e)))?;

        // 固定等待，不探测就绪
        tokio::time::sleep(self.settle_delay).await;

        if let Ok(Some(status)) = child.try_wait() {
            return Err(TunnelError::Exited(status.to_string()));
        }

        tracing::debug!("端口转发进程已启动: pid={:?}", child.id());
        Ok(TunnelHandle {
            spec: spec.clone(),
            child: Some(child),
        })
    }

    async fn stop(&self, mut handle: TunnelHandle) {
        let Some(mut child) = handle.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("端口转发进程已退出: {}", status);
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("查询端口转发进程状态失败: {}", e),
        }

        if let Err(e) = send_terminate(&mut child) {
            tracing::warn!("发送终止信号失败: {}", e);
        }

        match tokio::time::timeout(STOP_GRACE_PERIOD, child.wait()).await {
            Ok(Ok(_)) => tracing::info!("端口转发已停止"),
            Ok(Err(e)) => tracing::warn!("等待端口转发进程退出失败: {}", e),
            Err(_) => {
                tracing::warn!("端口转发进程未在 {:?} 内退出，强制结束", STOP_GRACE_PERIOD);
                if let Err(e) = child.kill().await {
                    tracing::warn!("强制结束端口转发进程失败: {}", e);
                }
            }
        }
    }
}

/// 直连模式：Keycloak 已可直接访问，不建立隧道
pub struct DirectConnection;

#[async_trait::async_trait]
impl TunnelManager for DirectConnection {
    async fn start(&self, spec: &TunnelSpec) -> Result<TunnelHandle, TunnelError> {
        tracing::info!("跳过端口转发，直接访问 Keycloak");
        Ok(TunnelHandle::detached(spec.clone()))
    }

    async fn stop(&self, _handle: TunnelHandle) {}
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(std::io::Error::from)
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
