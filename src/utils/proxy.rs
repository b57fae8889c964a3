//! HTTP客户端构建 - 读取系统代理环境变量
//!
//! 提取服务在部分网络环境下必须走代理才能访问

use anyhow::Result;
use std::time::Duration;
use tracing::info;

/// 构建全局共享的HTTP客户端（所有provider复用同一连接池）
pub fn build_http_client() -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(15));

    if let Some(proxy_url) = detect_proxy() {
        info!("HTTP客户端使用代理: {}", proxy_url);
        builder = builder.proxy(reqwest::Proxy::all(&proxy_url)?);
    }

    Ok(builder.build()?)
}

/// 从环境变量探测代理设置
///
/// 依次检查 HTTPS_PROXY/https_proxy/HTTP_PROXY/http_proxy
fn detect_proxy() -> Option<String> {
    for key in ["HTTPS_PROXY", "https_proxy", "HTTP_PROXY", "http_proxy"] {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
