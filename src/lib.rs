//! Vendor aggregation engine: concurrent fan-out across heterogeneous
//! vendor backends, per-vendor resilience (timeout, bounded retry, circuit
//! breaker), response normalization, best-vendor selection, and a
//! read-through cache fronting the whole pipeline.

pub mod aggregator;
pub mod api;
pub mod auth;
pub mod breaker;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod middleware;
pub mod normalize;
pub mod resilient;
pub mod selector;
pub mod vendor;

use crate::aggregator::Aggregator;
use std::time::Duration;

/// Shared application state handed to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub aggregator: Aggregator,
    /// Overall per-request deadline. `api::get_product` cancels the fan-out's
    /// `CancellationToken` once this elapses, regardless of how far the
    /// vendor calls have gotten.
    pub request_timeout: Duration,
}
