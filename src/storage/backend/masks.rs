//! 遮罩映射表操作
//!
//! URL 查找大小写不敏感（两侧都用 SQL `LOWER`），重复行取 id 最小的一条。

use std::sync::Arc;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ExprTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::{debug, info};

use super::schema::ManagedTable;
use super::{SeaOrmStorage, retry};
use crate::errors::{LinkMaskerError, Result};
use crate::storage::models::{ListQuery, MaskOrderBy, MaskRecord, Page, SortOrder};

use migration::entities::mask;

/// 构建排除列表时最多读取的遮罩数
pub const KNOWN_MASKS_LIMIT: u64 = 10_000;

fn to_record(model: mask::Model) -> MaskRecord {
    MaskRecord {
        id: model.id,
        url: model.url,
        mask: model.mask,
        shortener: model.shortener,
    }
}

/// `LOWER(url) = LOWER(?)`
fn url_matches(url: &str) -> Expr {
    Expr::expr(Func::lower(Expr::col(mask::Column::Url))).eq(Func::lower(Expr::val(url)))
}

/// `LOWER(short_url) = ?`
fn shortener_matches(tag: &str) -> Expr {
    Expr::expr(Func::lower(Expr::col(mask::Column::Shortener))).eq(tag.to_lowercase())
}

impl SeaOrmStorage {
    /// 按 URL 查找任意遮罩行的 id（数字编码使用）
    pub async fn find_mask_id_by_url(&self, url: &str) -> Result<Option<i64>> {
        self.heal_once(ManagedTable::Masks, move || async move {
            let db = &self.db;
            let found = retry::with_retry("find_mask_id_by_url", self.retry_config, || async {
                mask::Entity::find()
                    .select_only()
                    .column(mask::Column::Id)
                    .filter(url_matches(url))
                    .order_by_asc(mask::Column::Id)
                    .limit(1)
                    .into_tuple::<i64>()
                    .one(db)
                    .await
            })
            .await?;
            Ok(found)
        })
        .await
    }

    /// 按 URL 与短链服务标签查找已缓存的短链
    pub async fn find_short_mask(&self, url: &str, tag: &str) -> Result<Option<String>> {
        self.heal_once(ManagedTable::Masks, move || async move {
            let db = &self.db;
            let found = retry::with_retry("find_short_mask", self.retry_config, || async {
                mask::Entity::find()
                    .filter(url_matches(url))
                    .filter(shortener_matches(tag))
                    .order_by_asc(mask::Column::Id)
                    .one(db)
                    .await
            })
            .await?;
            Ok(found.map(|m| m.mask).filter(|m| !m.is_empty()))
        })
        .await
    }

    /// 插入遮罩行，返回新 id
    pub async fn insert_mask(&self, url: &str, mask_value: &str, tag: &str) -> Result<i64> {
        let id = self
            .heal_once(ManagedTable::Masks, move || async move {
                let model = mask::ActiveModel {
                    url: Set(url.to_string()),
                    mask: Set(mask_value.to_string()),
                    shortener: Set(tag.to_string()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?;
                Ok(model.id)
            })
            .await?;

        if !mask_value.is_empty() {
            self.invalidate_known_masks();
        }
        debug!("Mask #{} stored for {} (shortener: '{}')", id, url, tag);
        Ok(id)
    }

    /// 按 id 读取遮罩
    pub async fn get_mask(&self, id: i64) -> Result<Option<MaskRecord>> {
        self.heal_once(ManagedTable::Masks, move || async move {
            let db = &self.db;
            let found = retry::with_retry("get_mask", self.retry_config, || async {
                mask::Entity::find_by_id(id).one(db).await
            })
            .await?;
            Ok(found.map(to_record))
        })
        .await
    }

    pub async fn delete_mask(&self, id: i64) -> Result<()> {
        let db = &self.db;
        let result = retry::with_retry("delete_mask", self.retry_config, || async {
            mask::Entity::delete_by_id(id).exec(db).await
        })
        .await?;

        if result.rows_affected == 0 {
            return Err(LinkMaskerError::not_found(format!("遮罩不存在: {}", id)));
        }

        self.invalidate_known_masks();
        info!("Mask deleted: {}", id);
        Ok(())
    }

    pub async fn count_masks(&self) -> Result<u64> {
        let db = &self.db;
        let total = retry::with_retry("count_masks", self.retry_config, || async {
            mask::Entity::find().count(db).await
        })
        .await?;
        Ok(total)
    }

    /// 分页列出遮罩
    pub async fn list_masks(&self, query: ListQuery<MaskOrderBy>) -> Result<Page<MaskRecord>> {
        let column = match query.order_by {
            MaskOrderBy::Id => mask::Column::Id,
            MaskOrderBy::Url => mask::Column::Url,
            MaskOrderBy::Mask => mask::Column::Mask,
            MaskOrderBy::ShortUrl => mask::Column::Shortener,
        };
        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let page_size = std::cmp::Ord::max(query.page_size, 1);

        let db = &self.db;
        let total = self.count_masks().await?;
        let models = retry::with_retry("list_masks", self.retry_config, || async {
            mask::Entity::find()
                .order_by(column, order.clone())
                .order_by_asc(mask::Column::Id)
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

    /// 已知的非空遮罩值（最多 10000 条，缓存 60 秒）
    ///
    /// 用于把短链地址加入排除列表，避免二次遮罩。
    pub async fn known_masks(&self) -> Result<Arc<Vec<String>>> {
        if let Some(cached) = self.known_masks.get(&()) {
            return Ok(cached);
        }

        let db = &self.db;
        let masks = retry::with_retry("known_masks", self.retry_config, || async {
            mask::Entity::find()
                .select_only()
                .column(mask::Column::Mask)
                .filter(mask::Column::Mask.ne(""))
                .order_by_asc(mask::Column::Id)
                .limit(KNOWN_MASKS_LIMIT)
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await?;

        let masks = Arc::new(masks);
        self.known_masks.insert((), masks.clone());
        Ok(masks)
    }
}
