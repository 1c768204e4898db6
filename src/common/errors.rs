use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::types::now_ms;

/// JSON error body returned by the HTTP control surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// HTTP status code.
    pub status: u16,
    /// HTTP status reason phrase (e.g. "Bad Request").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// The request path that caused the error.
    pub path: String,
}

impl ApiError {
    fn new(
        status: u16,
        error: &str,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: now_ms(),
            status,
            error: error.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", message, path)
    }

    pub fn unauthorized(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", message, path)
    }

    pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(404, "Not Found", message, path)
    }

    pub fn conflict(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(409, "Conflict", message, path)
    }

    pub fn bad_gateway(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(502, "Bad Gateway", message, path)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
