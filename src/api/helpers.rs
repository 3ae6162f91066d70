//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

use crate::errors::SheetlinkerError;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(status: StatusCode, data: T) -> HttpResponse {
    json_response(status, ErrorCode::Success, "OK", Some(data))
}

/// 从 SheetlinkerError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_sheetlinker(err: &SheetlinkerError) -> HttpResponse {
    json_response::<()>(err.http_status(), ErrorCode::from(err), err.message(), None)
}

/// 统一 Result → HttpResponse 转换，成功时 200
pub fn api_result<T: Serialize>(result: Result<T, SheetlinkerError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(StatusCode::OK, data),
        Err(e) => error_from_sheetlinker(&e),
    }
}
