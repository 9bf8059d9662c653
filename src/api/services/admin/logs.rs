//! Admin API 跳转日志

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{info, trace};

use crate::config::MaskingConfig;
use crate::services::ClickLog;
use crate::storage::LogOrderBy;

use super::helpers::{api_result, error_from_linkmasker, error_response, success_response};
use super::types::{CountResponse, DeletedResponse, ListParams, PurgeRequest, PurgeResponse};

/// GET /admin/logs
pub async fn list_logs(
    query: web::Query<ListParams<LogOrderBy>>,
    logs: web::Data<ClickLog>,
) -> impl Responder {
    let query = query.into_inner().into_query();
    trace!("Admin API: list logs {:?}", query);
    api_result(logs.list(query).await)
}

/// GET /admin/logs/count
pub async fn count_logs(logs: web::Data<ClickLog>) -> impl Responder {
    api_result(logs.count().await.map(|count| CountResponse { count }))
}

/// GET /admin/logs/{id}
pub async fn get_log(path: web::Path<i64>, logs: web::Data<ClickLog>) -> HttpResponse {
    let id = path.into_inner();
    match logs.get(id).await {
        Ok(Some(record)) => success_response(record),
        Ok(None) => error_response(StatusCode::NOT_FOUND, &format!("Log {} not found", id)),
        Err(e) => error_from_linkmasker(&e),
    }
}

/// DELETE /admin/logs/{id}
pub async fn delete_log(path: web::Path<i64>, logs: web::Data<ClickLog>) -> HttpResponse {
    let id = path.into_inner();
    match logs.delete(id).await {
        Ok(true) => {
            info!("Admin API: log {} deleted", id);
            success_response(DeletedResponse { id, deleted: true })
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, &format!("Log {} not found", id)),
        Err(e) => error_from_linkmasker(&e),
    }
}

/// POST /admin/logs/purge
///
/// 立即清理，不受 24 小时间隔限制。
pub async fn purge_logs(
    body: Option<web::Json<PurgeRequest>>,
    logs: web::Data<ClickLog>,
    config: web::Data<Arc<MaskingConfig>>,
) -> HttpResponse {
    let days = body
        .and_then(|b| b.into_inner().days)
        .unwrap_or_else(|| config.log_duration_days());

    if days == 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "days must be greater than 0 (log_duration is 0, retention disabled)",
        );
    }

    match logs.purge_older_than(days).await {
        Ok(removed) => {
            info!("Admin API: purged {} logs older than {} days", removed, days);
            success_response(PurgeResponse { days, removed })
        }
        Err(e) => error_from_linkmasker(&e),
    }
}
