//! Read-through key-value cache with TTL, fronting both the product lookup
//! path and the rate-limit counter.
//!
//! Cache unavailability is never an error at this layer's call sites: every
//! implementation logs and returns a miss/no-op instead of propagating a
//! failure.

pub mod memory;
pub mod redis_cache;

pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-local hit/miss counters for a cache backend. Exposed only
/// through `tracing` fields at the call site — no metrics exporter is
/// wired to these.
#[derive(Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheMetrics {
    pub fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn hits_total(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses_total(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the raw stored string, or `None` on miss or any backend error.
    async fn get(&self, key: &str) -> Option<String>;

    /// Best-effort: a failure is logged internally and never raised.
    async fn set(&self, key: &str, value: &str, ttl: Duration);

    /// Idempotent.
    async fn delete(&self, key: &str);

    async fn exists(&self, key: &str) -> bool;

    /// Deletes all keys matching a glob-style pattern (e.g. `product:*`).
    async fn scan_delete(&self, pattern: &str);

    /// Process-local hit/miss counters accumulated by `get`.
    fn metrics(&self) -> &CacheMetrics;
}
