//! Admin API 路由配置

use actix_web::web;

use super::logs::{count_logs, delete_log, get_log, list_logs, purge_logs};
use super::masks::{count_masks, delete_mask, get_mask, list_masks};

/// 遮罩记录路由 `/masks`
///
/// - GET /masks - 分页列表
/// - GET /masks/count - 总数
/// - GET/DELETE /masks/{id}
pub fn masks_routes() -> actix_web::Scope {
    web::scope("/masks")
        .route("", web::get().to(list_masks))
        // 必须在 /{id} 之前
        .route("/count", web::get().to(count_masks))
        .route("/{id}", web::get().to(get_mask))
        .route("/{id}", web::delete().to(delete_mask))
}

/// 跳转日志路由 `/logs`
///
/// - GET /logs - 分页列表
/// - GET /logs/count - 总数
/// - POST /logs/purge - 清理过期日志
/// - GET/DELETE /logs/{id}
pub fn logs_routes() -> actix_web::Scope {
    web::scope("/logs")
        .route("", web::get().to(list_logs))
        .route("/count", web::get().to(count_logs))
        .route("/purge", web::post().to(purge_logs))
        .route("/{id}", web::get().to(get_log))
        .route("/{id}", web::delete().to(delete_log))
}

/// 挂载全部 Admin 路由
pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(masks_routes()).service(logs_routes());
}
