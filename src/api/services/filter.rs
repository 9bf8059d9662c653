//! 内容过滤 HTTP 接口
//!
//! 站点渲染完内容后把 HTML 交给 `/_linkmasker/filter`（单个内容单元）或
//! `/_linkmasker/page`（整页），拿回遮罩后的 HTML。
//! 未设置 `admin.token` 时整个 scope 返回 404。

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, middleware::from_fn, web};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::api::middleware::admin_auth;
use crate::config::{LinkEncoding, MaskingConfig, PostMaskOverride};
use crate::masking::{ContentFilter, ContentKind, RenderContext, RequestContext, cipher};
use crate::utils::extract_client_ip;

use super::admin::{ApiResponse, success_response};

/// 过滤请求；`visitor` 缺省时用本次 HTTP 请求的信息
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    #[serde(default = "default_kind")]
    pub kind: ContentKind,
    pub html: String,
    #[serde(default)]
    pub post_override: PostMaskOverride,
    #[serde(default)]
    pub is_feed: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub is_redirect_page: bool,
    #[serde(default)]
    pub visitor: Option<RequestContext>,
}

fn default_kind() -> ContentKind {
    ContentKind::Content
}

impl FilterRequest {
    fn render_context(&self, req: &HttpRequest, config: &MaskingConfig) -> RenderContext {
        let visitor = self
            .visitor
            .clone()
            .unwrap_or_else(|| visitor_from_request(req, config))
            .with_site_defaults(config);

        RenderContext {
            visitor,
            post_override: self.post_override,
            post_id_is_redirect_page: self.is_redirect_page,
            is_feed: self.is_feed,
            is_admin: self.is_admin,
            is_http: true,
            logged_in: self.logged_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub masking_type: String,
    pub separator: String,
    pub requested_encoding: LinkEncoding,
    pub effective_encoding: LinkEncoding,
    pub cipher_available: bool,
    pub encoding_warning: Option<String>,
}

/// 用 HTTP 请求头构建访客上下文
pub fn visitor_from_request(req: &HttpRequest, config: &MaskingConfig) -> RequestContext {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    };

    RequestContext {
        uri: req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string()),
        referer: header("referer"),
        user_agent: header("user-agent"),
        client_ip: extract_client_ip(req, &config.trusted_proxies),
        ..RequestContext::for_site(config)
    }
}

pub struct FilterService;

impl FilterService {
    /// POST /_linkmasker/filter
    pub async fn filter_block(
        req: HttpRequest,
        body: web::Json<FilterRequest>,
        filter: web::Data<ContentFilter>,
    ) -> HttpResponse {
        let body = body.into_inner();
        let ctx = body.render_context(&req, filter.config());
        trace!("Filtering {} block ({} bytes)", body.kind, body.html.len());

        let html = filter.render_block(body.kind, &body.html, &ctx).await;
        success_response(FilterResponse { html })
    }

    /// POST /_linkmasker/page
    pub async fn filter_page(
        req: HttpRequest,
        body: web::Json<FilterRequest>,
        filter: web::Data<ContentFilter>,
    ) -> HttpResponse {
        let body = body.into_inner();
        let ctx = body.render_context(&req, filter.config());
        trace!("Filtering full page ({} bytes)", body.html.len());

        let FilterRequest { html, .. } = body;
        let html = filter.wrap_full_response(move || html, &ctx).await;
        success_response(FilterResponse { html })
    }

    /// GET /_linkmasker/status
    pub async fn status(config: web::Data<Arc<MaskingConfig>>) -> HttpResponse {
        HttpResponse::Ok().json(ApiResponse {
            code: 0,
            data: StatusResponse {
                version: env!("CARGO_PKG_VERSION").to_string(),
                masking_type: config.masking.masking_type.to_string(),
                separator: config.separator().to_string(),
                requested_encoding: config.masking.link_encoding,
                effective_encoding: config.effective_encoding,
                cipher_available: cipher::is_available(),
                encoding_warning: config.encoding_warning.clone(),
            },
        })
    }
}

/// `/_linkmasker` 路由，与 Admin API 共用同一个 Bearer token
pub fn filter_routes() -> impl actix_web::dev::HttpServiceFactory {
    web::scope("/_linkmasker")
        .wrap(from_fn(admin_auth))
        .route("/filter", web::post().to(FilterService::filter_block))
        .route("/page", web::post().to(FilterService::filter_page))
        .route("/status", web::get().to(FilterService::status))
}
