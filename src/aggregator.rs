//! Aggregator: the single entry point, `get_product`. Composes the cache
//! read-through, parallel vendor fan-out, and selection. Owns the shared
//! dependencies behind `Arc` and spawns one task per vendor per request,
//! joining all of them before selecting a winner.

use crate::breaker::BreakerRegistry;
use crate::cache::Cache;
use crate::clock::Clock;
use crate::normalize::NormalizedRecord;
use crate::resilient::ResilientCaller;
use crate::selector::select_best;
use crate::vendor::VendorFetcher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Process-wide counter handed out one-per-request for log correlation
/// across the vendor fan-out. Not persisted, not part of any wire format.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregatedResult {
    Available(NormalizedRecord),
    OutOfStock,
    /// The enclosing request was cancelled before a result was produced.
    Cancelled,
}

pub struct AggregatorConfig {
    pub product_cache_ttl: Duration,
    pub vendor_timeout: Duration,
    pub vendor_retries: u32,
    pub freshness_window: Duration,
}

pub struct Aggregator {
    fetchers: Vec<Arc<dyn VendorFetcher>>,
    breakers: Arc<BreakerRegistry>,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(
        fetchers: Vec<Arc<dyn VendorFetcher>>,
        breakers: Arc<BreakerRegistry>,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            fetchers,
            breakers,
            cache,
            clock,
            config,
        }
    }

    fn cache_key(sku: &str) -> String {
        format!("product:{sku}")
    }

    pub async fn get_product(&self, sku: &str, cancel: CancellationToken) -> AggregatedResult {
        let request_id = next_request_id();
        let cache_key = Self::cache_key(sku);

        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!(
                request_id,
                sku,
                cache_hits_total = self.cache.metrics().hits_total(),
                cache_misses_total = self.cache.metrics().misses_total(),
                "cache_hit"
            );
            match serde_json::from_str::<NormalizedRecord>(&cached) {
                Ok(mut record) => {
                    record.request_id = request_id;
                    return AggregatedResult::Available(record);
                }
                Err(err) => {
                    warn!(sku, error = %err, "failed to deserialize cached record, treating as miss");
                }
            }
        } else {
            debug!(
                request_id,
                sku,
                cache_hits_total = self.cache.metrics().hits_total(),
                cache_misses_total = self.cache.metrics().misses_total(),
                "cache_miss"
            );
        }

        if cancel.is_cancelled() {
            return AggregatedResult::Cancelled;
        }

        let mut handles = Vec::with_capacity(self.fetchers.len());
        for fetcher in &self.fetchers {
            let fetcher = fetcher.clone();
            let breaker = self.breakers.get(fetcher.name());
            let clock = self.clock.clone();
            let cancel = cancel.clone();
            let sku = sku.to_string();
            let timeout = self.config.vendor_timeout;
            let retries = self.config.vendor_retries;
            let freshness_window = self.config.freshness_window;

            handles.push(tokio::spawn(async move {
                let caller = ResilientCaller::new(
                    VendorFetcherRef(fetcher),
                    breaker,
                    timeout,
                    retries,
                    freshness_window,
                );
                caller.call(&sku, cancel, clock.as_ref()).await
            }));
        }

        let mut candidates = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Some(mut record)) => {
                    record.request_id = request_id;
                    candidates.push(record);
                }
                Ok(None) => {}
                Err(err) => warn!(request_id, sku, error = %err, "vendor task panicked"),
            }
        }

        if cancel.is_cancelled() {
            return AggregatedResult::Cancelled;
        }

        match select_best(&candidates) {
            Some(record) => {
                let record = record.clone();
                if let Ok(serialized) = serde_json::to_string(&record) {
                    self.cache
                        .set(&cache_key, &serialized, self.config.product_cache_ttl)
                        .await;
                }
                info!(request_id, sku, vendor = record.vendor_name, "product_available");
                AggregatedResult::Available(record)
            }
            None => {
                info!(request_id, sku, "product_out_of_stock");
                AggregatedResult::OutOfStock
            }
        }
    }
}

/// Thin `Arc<dyn VendorFetcher>` wrapper so `ResilientCaller<F>` can be
/// generic over an owned, `Send + Sync` fetcher handle inside a spawned
/// task without naming the trait object as `F` directly.
struct VendorFetcherRef(Arc<dyn VendorFetcher>);

#[async_trait::async_trait]
impl VendorFetcher for VendorFetcherRef {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn fetch(
        &self,
        sku: &str,
        cancel: CancellationToken,
    ) -> crate::vendor::FetchOutcome {
        self.0.fetch(sku, cancel).await
    }
}
