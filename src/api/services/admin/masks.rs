//! Admin API 遮罩记录

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use tracing::{info, trace};

use crate::services::MaskStore;
use crate::storage::MaskOrderBy;

use super::helpers::{api_result, error_from_linkmasker, error_response, success_response};
use super::types::{CountResponse, DeletedResponse, ListParams};

/// GET /admin/masks
pub async fn list_masks(
    query: web::Query<ListParams<MaskOrderBy>>,
    store: web::Data<MaskStore>,
) -> impl Responder {
    let query = query.into_inner().into_query();
    trace!("Admin API: list masks {:?}", query);
    api_result(store.list(query).await)
}

/// GET /admin/masks/count
pub async fn count_masks(store: web::Data<MaskStore>) -> impl Responder {
    api_result(store.count().await.map(|count| CountResponse { count }))
}

/// GET /admin/masks/{id}
pub async fn get_mask(path: web::Path<i64>, store: web::Data<MaskStore>) -> HttpResponse {
    let id = path.into_inner();
    match store.get(id).await {
        Ok(Some(record)) => success_response(record),
        Ok(None) => error_response(StatusCode::NOT_FOUND, &format!("Mask {} not found", id)),
        Err(e) => error_from_linkmasker(&e),
    }
}

/// DELETE /admin/masks/{id}
pub async fn delete_mask(path: web::Path<i64>, store: web::Data<MaskStore>) -> HttpResponse {
    let id = path.into_inner();
    match store.delete(id).await {
        Ok(true) => {
            info!("Admin API: mask {} deleted", id);
            success_response(DeletedResponse { id, deleted: true })
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, &format!("Mask {} not found", id)),
        Err(e) => error_from_linkmasker(&e),
    }
}
