//! 跳转入口（默认服务）
//!
//! 未被其它路由匹配的请求都交给 `RedirectDispatcher`，不是跳转请求时返回 404。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::trace;

use crate::masking::{DispatchResponse, RedirectDispatcher};

use super::filter::visitor_from_request;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        dispatcher: web::Data<RedirectDispatcher>,
    ) -> HttpResponse {
        let visitor = visitor_from_request(&req, dispatcher.config());

        match dispatcher.dispatch(&visitor).await {
            Some(response) => Self::into_http(response),
            None => {
                trace!("No redirect marker in {}", visitor.uri);
                Self::not_found_response()
            }
        }
    }

    fn into_http(response: DispatchResponse) -> HttpResponse {
        let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
        let mut builder = HttpResponse::build(status);
        for (name, value) in &response.headers {
            builder.insert_header((name.as_str(), value.as_str()));
        }
        builder.body(response.body)
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Not Found")
    }
}
