//! 跳转日志服务
//!
//! 写入为尽力而为：失败时建表再写一条只含 url 与时间的精简记录，
//! 任何失败都不影响跳转本身。保留期清理由跳转请求顺带触发，每 24 小时至多一次。

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::errors::{LinkMaskerError, Result};
use crate::storage::backend::OPTION_LAST_CLEARED_LOGS;
use crate::storage::{
    ListQuery, LogOrderBy, LogRecord, ManagedTable, NewLogEntry, Page, SeaOrmStorage,
};

/// 两次清理的最小间隔（秒）
pub const PURGE_INTERVAL_SECS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct ClickLog {
    storage: Arc<SeaOrmStorage>,
}

impl ClickLog {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 追加一条日志，返回是否写入成功
    pub async fn append(&self, entry: &NewLogEntry) -> bool {
        let now = Utc::now();
        let err = match self.storage.insert_log(entry, now).await {
            Ok(id) => {
                debug!("Click #{} logged for {}", id, entry.url);
                return true;
            }
            Err(e) => e,
        };

        warn!("Failed to write redirect log: {}", err);

        if let Err(e) = self.storage.ensure_table(ManagedTable::Logs).await {
            warn!("Unable to create redirect log table: {}", e);
            return false;
        }

        match self.storage.insert_minimal_log(&entry.url, now).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Minimal redirect log insert failed: {}", e);
                false
            }
        }
    }

    /// 满足条件时清理过期日志，返回删除行数（未执行为 `None`）
    ///
    /// 条件：`log_duration_days > 0` 且上次清理不存在或已超过 24 小时。
    pub async fn maybe_purge(&self, log_duration_days: u32) -> Result<Option<u64>> {
        if log_duration_days == 0 {
            return Ok(None);
        }

        let now = Utc::now().timestamp();
        let last_cleared = self
            .storage
            .get_option(OPTION_LAST_CLEARED_LOGS)
            .await?
            .and_then(|v| v.trim().parse::<i64>().ok());

        if let Some(last) = last_cleared
            && now - last < PURGE_INTERVAL_SECS
        {
            return Ok(None);
        }

        let removed = self.purge_older_than(log_duration_days).await?;
        self.storage
            .set_option(OPTION_LAST_CLEARED_LOGS, &now.to_string())
            .await?;
        Ok(Some(removed))
    }

    /// 删除早于 `days` 天的日志
    pub async fn purge_older_than(&self, days: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let removed = self.storage.purge_logs_before(cutoff).await?;
        if removed > 0 {
            info!("Retention sweep removed {} redirect logs", removed);
        }
        Ok(removed)
    }

    pub async fn count(&self) -> Result<u64> {
        self.storage.count_logs().await
    }

    pub async fn get(&self, id: i64) -> Result<Option<LogRecord>> {
        self.storage.get_log(id).await
    }

    /// 删除日志，不存在时返回 false
    pub async fn delete(&self, id: i64) -> Result<bool> {
        match self.storage.delete_log(id).await {
            Ok(()) => Ok(true),
            Err(LinkMaskerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self, query: ListQuery<LogOrderBy>) -> Result<Page<LogRecord>> {
        self.storage.list_logs(query).await
    }
}
