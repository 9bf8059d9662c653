//! Server mode
//!
//! HTTP 服务：过滤接口、Admin API，其余请求全部交给跳转分发。

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders, from_fn},
    web,
};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api::middleware::{AdminToken, admin_auth};
use crate::api::services::admin::routes::admin_routes;
use crate::api::services::{RedirectService, filter_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Admin API 路由前缀
pub const ADMIN_PREFIX: &str = "/admin";

/// 注册路由（不含默认服务）
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(filter_routes()).service(
        web::scope(ADMIN_PREFIX)
            .wrap(from_fn(admin_auth))
            .configure(admin_routes),
    );
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let admin_token = AdminToken(config.admin.token.clone());
    if admin_token.is_enabled() {
        info!("Admin API available at: {}, filter API at: /_linkmasker", ADMIN_PREFIX);
    } else {
        warn!("Admin and filter APIs are disabled (admin.token not set)");
    }

    if config.site.trusted_proxies.is_empty() {
        warn!("No trusted proxies configured, X-Forwarded-For will be ignored");
    }

    let db_for_shutdown = startup.storage.get_db().clone();
    let masking = startup.config.clone();
    let mask_store = startup.mask_store.clone();
    let click_log = startup.click_log.clone();
    let filter = startup.filter.clone();
    let dispatcher = startup.dispatcher.clone();

    let workers = config.server.workers.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000")),
            )
            .app_data(web::Data::new(masking.clone()))
            .app_data(web::Data::new(mask_store.clone()))
            .app_data(web::Data::new(click_log.clone()))
            .app_data(web::Data::new(filter.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(admin_token.clone()))
            .app_data(web::JsonConfig::default().limit(8 * 1024 * 1024))
            .configure(configure_routes)
            .default_service(web::to(RedirectService::handle_redirect))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?;

    warn!("Starting server at http://{} ({} workers)", bind_address, workers);
    let server = server.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(db_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}
