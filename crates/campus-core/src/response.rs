//! JSON response envelope shared by every campus endpoint.
//!
//! Success: `{ "success": true, "message": ..., "data": ... }`.
//! Failure: `{ "success": false, "error": ..., "code": ... }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

pub fn success<T>(status: StatusCode, message: impl Into<String>, data: T) -> Response
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        message: message.into(),
        data,
    };
    (status, Json(body)).into_response()
}

pub fn failure(status: StatusCode, code: &'static str, error: impl Into<String>) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: error.into(),
        code,
    };
    (status, Json(body)).into_response()
}
