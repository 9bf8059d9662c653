//! 启动准备
//!
//! 连接存储、解析加密密钥、构建 `MaskingConfig` 和各服务。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::{LinkEncoding, MaskingConfig, StaticConfig, generate_encryption_key};
use crate::config::validators::validate_static_config;
use crate::masking::{ContentFilter, LinkEncoder, RedirectDispatcher, cipher};
use crate::services::{ClickLog, MaskStore, build_provider};
use crate::storage::backend::OPTION_ENCRYPTION_KEY;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub config: Arc<MaskingConfig>,
    pub mask_store: MaskStore,
    pub click_log: ClickLog,
    pub filter: ContentFilter,
    pub dispatcher: RedirectDispatcher,
}

impl StartupContext {
    /// 在已有存储上组装服务（测试也走这里）
    pub async fn assemble(config: &StaticConfig, storage: Arc<SeaOrmStorage>) -> Result<Self> {
        let stored_key = resolve_encryption_key(config, &storage).await?;
        let masking = Arc::new(MaskingConfig::build(config, stored_key.as_deref()));

        let mask_store = MaskStore::new(storage.clone(), build_provider(&masking.shortener));
        let click_log = ClickLog::new(storage.clone());
        let encoder = LinkEncoder::new(&masking, Some(mask_store.clone()));

        let filter = ContentFilter::with_encoder(
            masking.clone(),
            encoder.clone(),
            Some(mask_store.clone()),
        );
        let dispatcher = RedirectDispatcher::new(masking.clone(), encoder, Some(click_log.clone()));

        info!(
            "Masking: type={}, encoding={}, marker={}",
            masking.masking.masking_type,
            masking.effective_encoding,
            masking.separator()
        );

        Ok(Self {
            storage,
            config: masking,
            mask_store,
            click_log,
            filter,
            dispatcher,
        })
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    for problem in validate_static_config(config) {
        warn!("Config: {}", problem);
    }

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to initialize storage")?;
    info!("Using storage backend: {}", storage.backend_name());

    let context = StartupContext::assemble(config, storage).await?;

    debug!("Pre-startup processing completed in {:?}", start_time.elapsed());
    Ok(context)
}

/// 读取持久化的密钥；需要 aes256 但没有任何密钥时生成一个并保存
///
/// 配置文件中的密钥优先，此时不访问选项表。
async fn resolve_encryption_key(
    config: &StaticConfig,
    storage: &SeaOrmStorage,
) -> Result<Option<String>> {
    let configured = config
        .masking
        .encryption_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if configured {
        return Ok(None);
    }

    let stored = match storage.get_option(OPTION_ENCRYPTION_KEY).await {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            warn!("Unable to read stored encryption key: {}", e);
            None
        }
    };
    if stored.is_some() {
        return Ok(stored);
    }

    if config.masking.link_encoding != LinkEncoding::Aes256 || !cipher::is_available() {
        return Ok(None);
    }

    let key = generate_encryption_key();
    storage
        .set_option(OPTION_ENCRYPTION_KEY, &key)
        .await
        .context("Failed to persist generated encryption key")?;
    info!("Generated a new encryption key and stored it in the options table");
    Ok(Some(key))
}
