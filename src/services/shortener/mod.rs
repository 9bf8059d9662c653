//! 第三方短链服务
//!
//! 统一的短链接口，启动时根据 `[shortener] provider` 选择实现。
//! 每次请求只尝试一次，失败由调用方回退为原链接。

mod providers;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{Shortener, ShortenerConfig};
use crate::errors::Result;

pub use providers::HttpShortener;

/// 短链服务 trait
#[async_trait]
pub trait ShortenerProvider: Send + Sync {
    /// 提交原始链接，返回短链地址
    async fn shorten(&self, url: &str) -> Result<String>;

    /// 对应的服务类型（决定 `short_url` 列的标签）
    fn kind(&self) -> Shortener;
}

/// 根据配置构建短链服务，`provider = none` 时返回 `None`
pub fn build_provider(config: &ShortenerConfig) -> Option<Arc<dyn ShortenerProvider>> {
    if !config.provider.is_enabled() {
        return None;
    }

    let missing = match config.provider {
        Shortener::Adfly => config.adfly_api_key.is_empty() || config.adfly_user_id.is_empty(),
        Shortener::Bitly => config.bitly_login.is_empty() || config.bitly_api_key.is_empty(),
        Shortener::Shortest => config.shortest_api_key.is_empty(),
        Shortener::Yourls => config.yourls_domain.is_empty() || config.yourls_signature.is_empty(),
        Shortener::None => false,
    };
    if missing {
        warn!(
            "Shortener '{}' is enabled but its credentials are incomplete; requests will likely fail",
            config.provider
        );
    }

    info!("Shortener: using {} provider", config.provider);
    Some(Arc::new(HttpShortener::new(config.clone())))
}
