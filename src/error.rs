//! Error taxonomy for the aggregator's outward HTTP contract.
//!
//! Vendor errors, breaker-open outcomes, normalizer rejections, and cache
//! failures never reach this layer — they are recovered inside the
//! aggregator and collapse to `None` per vendor. Only the handful of
//! variants below ever cross the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid SKU format: {0}")]
    InvalidInput(String),

    #[error("missing x-api-key header")]
    Unauthenticated,

    #[error("rate limit exceeded: {current_count}/{limit}")]
    RateLimited {
        current_count: u32,
        limit: u32,
        retry_after: u64,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let timestamp = Utc::now().to_rfc3339();

        match self {
            AppError::InvalidInput(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_sku",
                    "detail": detail,
                    "timestamp": timestamp,
                })),
            )
                .into_response(),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "missing_api_key",
                    "detail": "x-api-key header is required",
                    "timestamp": timestamp,
                })),
            )
                .into_response(),
            AppError::RateLimited {
                current_count,
                limit,
                retry_after,
            } => {
                let body = Json(json!({
                    "error": "rate_limit_exceeded",
                    "detail": format!("Maximum {limit} requests per minute allowed"),
                    "current_count": current_count,
                    "limit": limit,
                    "retry_after": retry_after,
                    "timestamp": timestamp,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                let headers = response.headers_mut();
                for (name, value) in [
                    ("X-RateLimit-Limit", limit.to_string()),
                    ("X-RateLimit-Remaining", "0".to_string()),
                    ("X-RateLimit-Reset", retry_after.to_string()),
                    ("Retry-After", retry_after.to_string()),
                ] {
                    if let Ok(value) = axum::http::HeaderValue::from_str(&value) {
                        headers.insert(name, value);
                    }
                }
                response
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "internal_error",
                        "detail": "an unexpected error occurred",
                        "timestamp": timestamp,
                    })),
                )
                    .into_response()
            }
        }
    }
}
