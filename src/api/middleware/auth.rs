//! Admin API 认证
//!
//! `Authorization: Bearer {admin.token}`，token 为空时整个 Admin API 返回 404。

use actix_web::{
    Error, HttpResponse,
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    middleware::Next,
    web,
};
use subtle::ConstantTimeEq;
use tracing::{debug, info, trace};

use crate::api::services::admin::ApiResponse;

/// 配置中的管理 token
#[derive(Clone, Debug, Default)]
pub struct AdminToken(pub String);

impl AdminToken {
    pub fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    /// 常量时间比较
    pub fn verify(&self, candidate: &str) -> bool {
        self.is_enabled() && bool::from(self.0.as_bytes().ct_eq(candidate.as_bytes()))
    }
}

fn extract_bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
}

pub async fn admin_auth<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let token = req
        .app_data::<web::Data<AdminToken>>()
        .map(|t| t.get_ref().clone())
        .unwrap_or_default();

    if !token.is_enabled() {
        debug!("Admin token not configured - returning 404");
        return Ok(req.into_response(
            HttpResponse::NotFound()
                .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                .body("Not Found")
                .map_into_right_body(),
        ));
    }

    match extract_bearer_token(&req) {
        Some(candidate) if token.verify(candidate) => {
            trace!("Admin authentication succeeded");
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        _ => {
            info!("Admin authentication failed - invalid or missing token");
            Ok(req.into_response(
                HttpResponse::Unauthorized()
                    .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                    .json(ApiResponse {
                        code: 401,
                        data: serde_json::json!({ "error": "Unauthorized: Invalid or missing token" }),
                    })
                    .map_into_right_body(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_verify() {
        let token = AdminToken("secret".to_string());
        assert!(token.verify("secret"));
        assert!(!token.verify("secreT"));
        assert!(!token.verify(""));

        let disabled = AdminToken::default();
        assert!(!disabled.is_enabled());
        assert!(!disabled.verify(""));
    }
}
