//! 存储层集成测试（临时 SQLite）

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::ConnectionTrait;
use tempfile::TempDir;

use linkmasker::config::DatabaseConfig;
use linkmasker::services::ClickLog;
use linkmasker::storage::{
    ListQuery, LogOrderBy, MaskOrderBy, NewLogEntry, SeaOrmStorage, SortOrder, StorageFactory,
};
use linkmasker::storage::backend::{OPTION_LAST_CLEARED_LOGS, infer_backend_from_url};

async fn create_storage(dir: &TempDir) -> Arc<SeaOrmStorage> {
    let path = dir.path().join("linkmasker.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", path.display()),
        ..Default::default()
    };
    StorageFactory::create(&config)
        .await
        .expect("Failed to create storage")
}

fn log_entry(url: &str) -> NewLogEntry {
    NewLogEntry {
        url: url.to_string(),
        referring_url: Some("https://mysite.example/post".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
        ip_address: Some("203.0.113.9".to_string()),
    }
}

#[test]
fn test_infer_backend() {
    assert_eq!(infer_backend_from_url("sqlite://data.db").unwrap(), "sqlite");
    assert_eq!(
        infer_backend_from_url("postgres://u:p@localhost/db").unwrap(),
        "postgres"
    );
    assert_eq!(
        infer_backend_from_url("mysql://u:p@localhost/db").unwrap(),
        "mysql"
    );
    assert!(infer_backend_from_url("redis://localhost").is_err());
}

#[tokio::test]
async fn test_mask_crud() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    let first = storage.insert_mask("https://a.example/", "", "").await.unwrap();
    let short = storage
        .insert_mask("https://b.example/", "https://bit.ly/xyz", "bitly")
        .await
        .unwrap();
    assert!(short > first);

    assert_eq!(
        storage.find_mask_id_by_url("https://a.example/").await.unwrap(),
        Some(first)
    );
    assert_eq!(
        storage.find_mask_id_by_url("https://missing.example/").await.unwrap(),
        None
    );
    assert_eq!(
        storage
            .find_short_mask("https://b.example/", "bitly")
            .await
            .unwrap()
            .as_deref(),
        Some("https://bit.ly/xyz")
    );
    assert_eq!(
        storage.find_short_mask("https://b.example/", "adfly").await.unwrap(),
        None
    );

    let record = storage.get_mask(short).await.unwrap().unwrap();
    assert_eq!(record.url, "https://b.example/");
    assert_eq!(record.mask, "https://bit.ly/xyz");
    assert_eq!(record.shortener, "bitly");

    assert_eq!(storage.count_masks().await.unwrap(), 2);

    let page = storage
        .list_masks(ListQuery {
            page: 1,
            page_size: 1,
            order_by: MaskOrderBy::Id,
            order: SortOrder::Asc,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, first);

    storage.delete_mask(first).await.unwrap();
    assert!(storage.delete_mask(first).await.is_err());
    assert_eq!(storage.count_masks().await.unwrap(), 1);
}

#[tokio::test]
async fn test_zero_paging_is_clamped_to_one() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    storage.insert_mask("https://a.example/", "", "").await.unwrap();
    storage
        .insert_log(&log_entry("https://a.example/"), Utc::now())
        .await
        .unwrap();

    let masks = storage
        .list_masks(ListQuery {
            page: 0,
            page_size: 0,
            order_by: MaskOrderBy::Id,
            order: SortOrder::Asc,
        })
        .await
        .unwrap();
    assert_eq!((masks.page, masks.page_size), (1, 1));
    assert_eq!(masks.items.len(), 1);

    let logs = storage
        .list_logs(ListQuery {
            page: 0,
            page_size: 0,
            order_by: LogOrderBy::default(),
            order: SortOrder::Desc,
        })
        .await
        .unwrap();
    assert_eq!((logs.page, logs.page_size), (1, 1));
    assert_eq!(logs.items.len(), 1);
}

#[tokio::test]
async fn test_duplicate_rows_resolve_to_lowest_id() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    let first = storage.insert_mask("https://dup.example/", "", "").await.unwrap();
    storage.insert_mask("https://dup.example/", "", "").await.unwrap();

    assert_eq!(
        storage.find_mask_id_by_url("https://dup.example/").await.unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn test_known_masks_only_lists_short_links() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    storage.insert_mask("https://a.example/", "", "").await.unwrap();
    storage
        .insert_mask("https://b.example/", "https://bit.ly/b", "bitly")
        .await
        .unwrap();

    let known = storage.known_masks().await.unwrap();
    assert_eq!(known.as_slice(), ["https://bit.ly/b".to_string()]);
}

#[tokio::test]
async fn test_logs_and_purge() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    let now = Utc::now();
    let old = storage
        .insert_log(&log_entry("https://old.example/"), now - Duration::days(40))
        .await
        .unwrap();
    let fresh = storage
        .insert_log(&log_entry("https://fresh.example/"), now)
        .await
        .unwrap();

    let record = storage.get_log(fresh).await.unwrap().unwrap();
    assert_eq!(record.url, "https://fresh.example/");
    assert_eq!(record.ip_address.as_deref(), Some("203.0.113.9"));

    let page = storage
        .list_logs(ListQuery::<LogOrderBy>::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    // 默认按日期倒序
    assert_eq!(page.items[0].id, fresh);

    let removed = storage
        .purge_logs_before(now - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(storage.get_log(old).await.unwrap().is_none());
    assert_eq!(storage.count_logs().await.unwrap(), 1);
}

#[tokio::test]
async fn test_retention_sweep_runs_once_per_day() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;
    let click_log = ClickLog::new(storage.clone());

    storage
        .insert_log(&log_entry("https://old.example/"), Utc::now() - Duration::days(10))
        .await
        .unwrap();

    assert_eq!(click_log.maybe_purge(0).await.unwrap(), None);
    assert_eq!(click_log.maybe_purge(7).await.unwrap(), Some(1));
    assert!(
        storage
            .get_option(OPTION_LAST_CLEARED_LOGS)
            .await
            .unwrap()
            .is_some()
    );

    storage
        .insert_log(&log_entry("https://old2.example/"), Utc::now() - Duration::days(10))
        .await
        .unwrap();
    // 24 小时内不再清理
    assert_eq!(click_log.maybe_purge(7).await.unwrap(), None);
    assert_eq!(storage.count_logs().await.unwrap(), 1);
}

#[tokio::test]
async fn test_options_upsert() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    assert_eq!(storage.get_option("encryption_key").await.unwrap(), None);
    storage.set_option("encryption_key", "one").await.unwrap();
    storage.set_option("encryption_key", "two").await.unwrap();
    assert_eq!(
        storage.get_option("encryption_key").await.unwrap().as_deref(),
        Some("two")
    );
}

#[tokio::test]
async fn test_mask_table_self_heals() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;

    storage
        .get_db()
        .execute_unprepared("DROP TABLE external_links_masks")
        .await
        .unwrap();

    let id = storage.insert_mask("https://a.example/", "", "").await.unwrap();
    assert_eq!(
        storage.find_mask_id_by_url("https://a.example/").await.unwrap(),
        Some(id)
    );
}

#[tokio::test]
async fn test_click_log_recreates_missing_table() {
    let dir = TempDir::new().unwrap();
    let storage = create_storage(&dir).await;
    let click_log = ClickLog::new(storage.clone());

    storage
        .get_db()
        .execute_unprepared("DROP TABLE external_links_logs")
        .await
        .unwrap();

    assert!(click_log.append(&log_entry("https://a.example/")).await);
    assert_eq!(storage.count_logs().await.unwrap(), 1);

    // 精简记录只保留 url 与时间
    let page = click_log
        .list(ListQuery::<LogOrderBy>::default())
        .await
        .unwrap();
    assert_eq!(page.items[0].url, "https://a.example/");
    assert_eq!(page.items[0].user_agent, None);
}
