//! 出站 HTTP
//!
//! 短链服务与自定义落地页共用一个全局 ureq Agent（2 秒总超时）。
//! ureq 是同步客户端，异步路径通过 `spawn_blocking` 调用。

use std::sync::OnceLock;
use std::time::Duration;

use tracing::{trace, warn};
use ureq::Agent;

use crate::errors::{LinkMaskerError, Result};

/// HTTP 请求超时时间
pub const HTTP_TIMEOUT_SECS: u64 = 2;

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

pub fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// 同步抓取页面正文
fn fetch_text_sync(url: &str) -> Result<String> {
    let resp = get_agent()
        .get(url)
        .call()
        .map_err(|e| LinkMaskerError::http(format!("GET {} failed: {}", url, e)))?;

    resp.into_body()
        .read_to_string()
        .map_err(|e| LinkMaskerError::http(format!("Reading {} failed: {}", url, e)))
}

/// 抓取页面正文（异步包装）
pub async fn fetch_text(url: &str) -> Result<String> {
    let target = url.to_string();
    trace!("Fetching {}", target);

    tokio::task::spawn_blocking(move || fetch_text_sync(&target))
        .await
        .unwrap_or_else(|e| {
            warn!("HTTP fetch spawn_blocking failed: {}", e);
            Err(LinkMaskerError::http(format!(
                "spawn_blocking failed: {}",
                e
            )))
        })
}
