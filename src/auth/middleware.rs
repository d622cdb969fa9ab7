//! API-key gate: a request without an `x-api-key` header is rejected with
//! 401 before it reaches rate limiting or the aggregator. The key itself
//! becomes the rate-limit counter's identity.

use crate::error::AppError;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

/// Request extension carrying the caller's API key past this middleware,
/// for the rate limiter and handlers to read.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, AppError> {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .ok_or(AppError::Unauthenticated)?;

    req.extensions_mut().insert(ApiKey(api_key));
    Ok(next.run(req).await)
}
