//! 遮罩映射服务
//!
//! - 数字编码：`(url, "", "")` 行的 id 即令牌
//! - 短链：先查缓存行，未命中才调用短链服务并持久化结果
//!
//! 并发首次创建可能产生重复行，查询总是取 id 最小的一条。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Shortener;
use crate::errors::{LinkMaskerError, Result};
use crate::masking::html::decode_entities;
use crate::services::shortener::ShortenerProvider;
use crate::storage::{ListQuery, MaskOrderBy, MaskRecord, Page, SeaOrmStorage};

#[derive(Clone)]
pub struct MaskStore {
    storage: Arc<SeaOrmStorage>,
    provider: Option<Arc<dyn ShortenerProvider>>,
}

impl MaskStore {
    pub fn new(storage: Arc<SeaOrmStorage>, provider: Option<Arc<dyn ShortenerProvider>>) -> Self {
        Self { storage, provider }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    /// 当前启用的短链服务
    pub fn shortener(&self) -> Shortener {
        self.provider
            .as_ref()
            .map(|p| p.kind())
            .unwrap_or(Shortener::None)
    }

    /// 查找或创建遮罩
    ///
    /// - `Shortener::None`：返回数字 id（字符串）
    /// - 其他：返回短链地址；短链服务失败时返回原链接且不写库
    pub async fn find_or_create(&self, url: &str, shortener: Shortener) -> Result<String> {
        if !shortener.is_enabled() {
            if let Some(id) = self.storage.find_mask_id_by_url(url).await? {
                return Ok(id.to_string());
            }
            let id = self.storage.insert_mask(url, "", "").await?;
            return Ok(id.to_string());
        }

        let decoded = decode_entities(url);
        if let Some(short) = self.storage.find_short_mask(&decoded, shortener.tag()).await? {
            debug!("Shortener cache hit for {}", decoded);
            return Ok(short);
        }

        let provider = self
            .provider
            .as_ref()
            .filter(|p| p.kind() == shortener)
            .ok_or_else(|| {
                LinkMaskerError::validation(format!("Shortener '{}' is not configured", shortener))
            })?;

        match provider.shorten(url).await {
            Ok(short) => {
                if let Err(e) = self
                    .storage
                    .insert_mask(&decoded, &short, shortener.tag())
                    .await
                {
                    warn!("Failed to persist short url for {}: {}", decoded, e);
                }
                Ok(short)
            }
            Err(e) => {
                warn!("Shortener {} failed for {}: {}", shortener, url, e);
                Ok(url.to_string())
            }
        }
    }

    /// 只查找，不创建
    pub async fn find(&self, url: &str, shortener: Shortener) -> Result<Option<String>> {
        if !shortener.is_enabled() {
            let id = self.storage.find_mask_id_by_url(url).await?;
            return Ok(id.map(|id| id.to_string()));
        }
        self.storage
            .find_short_mask(&decode_entities(url), shortener.tag())
            .await
    }

    /// 按 id 取原链接（数字令牌解码）
    pub async fn url_for_id(&self, id: i64) -> Result<Option<String>> {
        Ok(self.storage.get_mask(id).await?.map(|r| r.url))
    }

    pub async fn get(&self, id: i64) -> Result<Option<MaskRecord>> {
        self.storage.get_mask(id).await
    }

    /// 删除遮罩，不存在时返回 false
    pub async fn delete(&self, id: i64) -> Result<bool> {
        match self.storage.delete_mask(id).await {
            Ok(()) => Ok(true),
            Err(LinkMaskerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self, query: ListQuery<MaskOrderBy>) -> Result<Page<MaskRecord>> {
        self.storage.list_masks(query).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.storage.count_masks().await
    }

    /// 已发出的短链（构建排除列表）
    pub async fn known_masks(&self) -> Result<Arc<Vec<String>>> {
        self.storage.known_masks().await
    }
}
