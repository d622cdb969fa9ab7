//! HTTP surface: `GET /products/{sku}`, `GET /health`, `GET /`. Everything
//! about aggregation lives in `AppState`; handlers only validate input and
//! shape the response.

use crate::aggregator::AggregatedResult;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

static SKU_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]{3,20}$").unwrap());

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !SKU_PATTERN.is_match(&sku) {
        return Err(AppError::InvalidInput(format!(
            "sku must match ^[A-Za-z0-9]{{3,20}}$, got {sku:?}"
        )));
    }

    let cancel = CancellationToken::new();
    let deadline = tokio::spawn({
        let cancel = cancel.clone();
        let request_timeout = state.request_timeout;
        async move {
            tokio::time::sleep(request_timeout).await;
            cancel.cancel();
        }
    });

    let result = state.aggregator.get_product(&sku, cancel).await;
    deadline.abort();

    let timestamp = Utc::now().to_rfc3339();
    let body = match result {
        AggregatedResult::Available(record) => json!({
            "sku": record.sku,
            "vendor": record.vendor_name,
            "price": record.price,
            "stock": record.stock,
            "status": "AVAILABLE",
            "timestamp": timestamp,
        }),
        AggregatedResult::OutOfStock | AggregatedResult::Cancelled => json!({
            "sku": sku,
            "status": "OUT_OF_STOCK",
            "timestamp": timestamp,
        }),
    };

    Ok(Json(body))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "vendor-aggregator",
    }))
}

pub async fn service_descriptor() -> impl IntoResponse {
    Json(json!({
        "service": "vendor-aggregator",
        "description": "Concurrent vendor aggregation and resilience engine",
        "endpoints": ["/products/{sku}", "/health"],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_pattern_accepts_alphanumeric_within_length_bounds() {
        assert!(SKU_PATTERN.is_match("SKU001"));
        assert!(SKU_PATTERN.is_match("abc"));
        assert!(!SKU_PATTERN.is_match("ab"));
        assert!(!SKU_PATTERN.is_match("has-a-dash"));
        assert!(!SKU_PATTERN.is_match(&"a".repeat(21)));
    }
}
