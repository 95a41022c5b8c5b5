//! 打开系统默认浏览器

use anyhow::Context;

/// 在默认浏览器中打开 URL
///
/// 只负责启动外部程序，不等待其退出
pub fn open_url(url: &str) -> anyhow::Result<()> {
    let mut command = opener_command(url);
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    command
        .spawn()
        .with_context(|| format!("无法打开浏览器: {}", url))?;
    Ok(())
}

#[cfg(windows)]
fn opener_command(url: &str) -> std::process::Command {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    let mut command = std::process::Command::new("cmd");
    command.args(["/C", "start", "", url]).creation_flags(CREATE_NO_WINDOW);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("open");
    command.arg(url);
    command
}

#[cfg(all(unix, not(target_os = "macos")))]
fn opener_command(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("xdg-open");
    command.arg(url);
    command
}
