//! Admin API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::LinkMaskerError;

use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, code: i32, data: T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse { code, data })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, 0, data)
}

/// 构建错误响应，`code` 与 HTTP 状态码一致
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(
        status,
        status.as_u16() as i32,
        serde_json::json!({ "error": message }),
    )
}

/// 从 LinkMaskerError 构建错误响应
pub fn error_from_linkmasker(err: &LinkMaskerError) -> HttpResponse {
    error_response(err.http_status(), err.message())
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<LinkMaskerError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => {
            let err: LinkMaskerError = e.into();
            error_from_linkmasker(&err)
        }
    }
}
