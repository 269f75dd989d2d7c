//! Error payloads returned to the chat front-end

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use text_completion::CompletionError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Serialized as `{ "error": ..., "details": ... }`.
#[derive(Debug, Clone, Serialize, Error)]
#[error("[{status}] {error}: {details}")]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,

    /// Short, fixed label for the status
    pub error: &'static str,

    /// What went wrong, for a human
    pub details: String,
}

impl ApiError {
    /// 400 Bad Request
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Bad Request",
            details: details.into(),
        }
    }

    /// 500 Internal Server Error
    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal server error",
            details: details.into(),
        }
    }
}

/// Every orchestration failure is a 500, with the error text as details.
impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
