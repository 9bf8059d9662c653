//! SeaORM storage backend
//!
//! Persists masks, redirect logs and plugin options,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod logs;
mod masks;
mod options;
pub mod retry;
mod schema;

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{LinkMaskerError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use masks::KNOWN_MASKS_LIMIT;
pub use options::{OPTION_ENCRYPTION_KEY, OPTION_LAST_CLEARED_LOGS};
pub use schema::ManagedTable;

/// 已知遮罩值缓存 TTL
const KNOWN_MASKS_TTL_SECS: u64 = 60;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LinkMaskerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 已知遮罩值缓存（构建排除列表用，TTL 60 秒）
    known_masks: Cache<(), Arc<Vec<String>>>,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        config: &DatabaseConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LinkMaskerError::database_config(
                "database_url 未设置".to_string(),
            ));
        }

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        // 运行迁移
        run_migrations(&db).await?;

        let storage = Self::from_connection(db, backend_name, retry::RetryConfig::from(config));
        info!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 使用已建立的连接构建（不运行迁移）
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        retry_config: retry::RetryConfig,
    ) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
            known_masks: Cache::builder()
                .time_to_live(Duration::from_secs(KNOWN_MASKS_TTL_SECS))
                .max_capacity(1)
                .build(),
            retry_config,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 清除已知遮罩缓存（遮罩变更时调用）
    pub fn invalidate_known_masks(&self) {
        self.known_masks.invalidate_all();
    }
}
