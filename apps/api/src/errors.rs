use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Classification of failures raised by an upstream collaborator
/// (model provider, search API, scraped site).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    RateLimited,
    Timeout,
    Invalid,
    Unknown,
}

/// Returns true when a failure should be reported as a capacity problem.
///
/// The typed kind wins; the substring check on the message is kept as a
/// fallback for providers that only signal throttling in prose.
pub fn is_rate_limited(kind: UpstreamErrorKind, message: &str) -> bool {
    kind == UpstreamErrorKind::RateLimited || message.to_lowercase().contains("rate limit")
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            AppError::RateLimited(msg) => {
                tracing::warn!("Rate limited: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate Limit Exceeded",
                    format!("{msg}. The service is at capacity, please try again later."),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    msg,
                )
            }
        };

        let body = Json(json!({
            "type": error_type,
            "message": message
        }));

        (status, body).into_response()
    }
}
