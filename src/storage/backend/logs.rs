//! 跳转日志表操作

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use tracing::{debug, info};

use super::{SeaOrmStorage, retry};
use crate::errors::{LinkMaskerError, Result};
use crate::storage::models::{ListQuery, LogOrderBy, LogRecord, NewLogEntry, Page, SortOrder};

use migration::entities::redirect_log;

fn to_record(model: redirect_log::Model) -> LogRecord {
    LogRecord {
        id: model.id,
        url: model.url,
        referring_url: model.referring_url,
        user_agent: model.user_agent,
        ip_address: model.ip_address,
        restricted: model.restricted,
        date: model.date,
    }
}

impl SeaOrmStorage {
    /// 写入完整日志行
    pub async fn insert_log(&self, entry: &NewLogEntry, date: DateTime<Utc>) -> Result<i64> {
        let model = redirect_log::ActiveModel {
            url: Set(entry.url.clone()),
            referring_url: Set(entry.referring_url.clone()),
            user_agent: Set(entry.user_agent.clone()),
            ip_address: Set(entry.ip_address.clone()),
            restricted: Set(None),
            date: Set(date),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        debug!("Redirect log #{} stored for {}", model.id, entry.url);
        Ok(model.id)
    }

    /// 只写 url 与 date 的精简日志行（建表自愈后的降级写入）
    pub async fn insert_minimal_log(&self, url: &str, date: DateTime<Utc>) -> Result<i64> {
        let model = redirect_log::ActiveModel {
            url: Set(url.to_string()),
            date: Set(date),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.id)
    }

    pub async fn get_log(&self, id: i64) -> Result<Option<LogRecord>> {
        let db = &self.db;
        let found = retry::with_retry("get_log", self.retry_config, || async {
            redirect_log::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(found.map(to_record))
    }

    pub async fn delete_log(&self, id: i64) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry("delete_log", self.retry_config, || async {
            redirect_log::Entity::delete_by_id(id).exec(db).await
        })
        .await?;

        if result.rows_affected == 0 {
            return Err(LinkMaskerError::not_found(format!("日志不存在: {}", id)));
        }

        info!("Redirect log deleted: {}", id);
        Ok(())
    }

    pub async fn count_logs(&self) -> Result<u64> {
        let db = &self.db;
        let total = retry::with_retry("count_logs", self.retry_config, || async {
            redirect_log::Entity::find().count(db).await
        })
        .await?;
        Ok(total)
    }

    /// 分页列出日志
    pub async fn list_logs(&self, query: ListQuery<LogOrderBy>) -> Result<Page<LogRecord>> {
        let column = match query.order_by {
            LogOrderBy::Id => redirect_log::Column::Id,
            LogOrderBy::Url => redirect_log::Column::Url,
            LogOrderBy::UserAgent => redirect_log::Column::UserAgent,
            LogOrderBy::IpAddress => redirect_log::Column::IpAddress,
            LogOrderBy::Date => redirect_log::Column::Date,
        };
        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let page_size = std::cmp::Ord::max(query.page_size, 1);

        let db = &self.db;
        let total = self.count_logs().await?;
        let models = retry::with_retry("list_logs", self.retry_config, || async {
            redirect_log::Entity::find()
                .order_by(column, order.clone())
                .order_by_desc(redirect_log::Column::Id)
                .paginate(db, page_size)
                .fetch_page(query.page.saturating_sub(1))
                .await
        })
        .await?;

        Ok(Page {
            items: models.into_iter().map(to_record).collect(),
            total,
            page: std::cmp::Ord::max(query.page, 1),
            page_size,
        })
    }

    /// 删除早于 `cutoff` 的日志，返回删除行数
    pub async fn purge_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let result = retry::with_retry("purge_logs_before", self.retry_config, || async {
            redirect_log::Entity::delete_many()
                .filter(redirect_log::Column::Date.lt(cutoff))
                .exec(db)
                .await
        })
        .await?;

        info!(
            "Purged {} redirect logs older than {}",
            result.rows_affected,
            cutoff.to_rfc3339()
        );
        Ok(result.rows_affected)
    }
}
