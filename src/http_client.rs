//! HTTP Client 构建模块

use reqwest::Client;
use std::time::Duration;

/// 构建访问 Keycloak 的 HTTP Client
///
/// 只限制建立连接的时间；整体请求超时由调用方按请求设置，
/// 用户查询和更新不受 token 请求超时约束
///
/// # Arguments
/// * `connect_timeout` - 建立连接超时
///
/// # Returns
/// 配置好的 reqwest::Client
pub fn build_client(connect_timeout: Duration) -> anyhow::Result<Client> {
    let builder = Client::builder()
        .connect_timeout(connect_timeout)
        // 端口转发只在本地监听，系统代理会把请求带偏
        .no_proxy();

    tracing::debug!("HTTP Client 连接超时: {:?}", connect_timeout);
    Ok(builder.build()?)
}
