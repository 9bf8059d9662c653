//! 运行时建表自愈
//!
//! 表被手动删除或迁移未执行时，写入路径检测到"表不存在"错误后
//! 调用 `ensure_table` 幂等建表，再重试一次。

use std::future::Future;

use migration::{SchemaManager, create_logs_table, create_masks_table, create_options_table};
use strum::AsRefStr;
use tracing::{info, warn};

use super::SeaOrmStorage;
use crate::errors::{LinkMaskerError, Result};

/// 引擎管理的表
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum ManagedTable {
    #[strum(serialize = "external_links_masks")]
    Masks,
    #[strum(serialize = "external_links_logs")]
    Logs,
    #[strum(serialize = "external_links_options")]
    Options,
}

impl SeaOrmStorage {
    /// 幂等创建指定的表（CREATE TABLE IF NOT EXISTS）
    pub async fn ensure_table(&self, table: ManagedTable) -> Result<()> {
        let manager = SchemaManager::new(&self.db);
        let result = match table {
            ManagedTable::Masks => create_masks_table(&manager).await,
            ManagedTable::Logs => create_logs_table(&manager).await,
            ManagedTable::Options => create_options_table(&manager).await,
        };

        match result {
            Ok(()) => {
                info!("Table {} ensured", table.as_ref());
                Ok(())
            }
            Err(e) => {
                warn!("Unable to create table {}: {}", table.as_ref(), e);
                Err(LinkMaskerError::database_operation(format!(
                    "Unable to create \"{}\" table: {}",
                    table.as_ref(),
                    e
                )))
            }
        }
    }
}

impl SeaOrmStorage {
    /// 执行操作；若因表不存在失败，建表后再执行一次
    pub(crate) async fn heal_once<T, F, Fut>(&self, table: ManagedTable, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Err(e) if e.is_schema_missing() => {
                warn!("Table {} is missing, recreating it: {}", table.as_ref(), e);
                self.ensure_table(table).await?;
                op().await
            }
            other => other,
        }
    }
}
