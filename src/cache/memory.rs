//! In-process cache backend. A legitimate standalone backend for local
//! development without Redis, and the backend used by the test suite.
//!
//! A `parking_lot::Mutex`-guarded `HashMap` keyed by cache key, storing an
//! explicit expiry alongside each value for deterministic tests.

use super::{Cache, CacheMetrics};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    metrics: CacheMetrics,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let result = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        self.metrics.record(result.is_some());
        result
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn scan_delete(&self, pattern: &str) {
        let prefix = pattern.trim_end_matches('*');
        self.entries.lock().retain(|k, _| !k.starts_with(prefix));
    }

    fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_within_ttl_returns_value() {
        let cache = InMemoryCache::new();
        cache.set("product:SKU001", "hello", Duration::from_secs(60)).await;
        assert_eq!(cache.get("product:SKU001").await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn get_after_ttl_returns_none() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let cache = InMemoryCache::new();
        cache.delete("missing").await;
        cache.set("k", "v", Duration::from_secs(10)).await;
        cache.delete("k").await;
        cache.delete("k").await;
        assert!(!cache.exists("k").await);
    }

    #[tokio::test]
    async fn scan_delete_removes_matching_prefix() {
        let cache = InMemoryCache::new();
        cache.set("rate_limit:abc:1", "1", Duration::from_secs(60)).await;
        cache.set("rate_limit:abc:2", "1", Duration::from_secs(60)).await;
        cache.set("product:SKU001", "x", Duration::from_secs(60)).await;

        cache.scan_delete("rate_limit:*").await;

        assert!(!cache.exists("rate_limit:abc:1").await);
        assert!(!cache.exists("rate_limit:abc:2").await);
        assert!(cache.exists("product:SKU001").await);
    }

    #[tokio::test]
    async fn get_updates_hit_and_miss_counters() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::from_secs(60)).await;

        cache.get("k").await;
        cache.get("missing").await;
        cache.get("k").await;

        assert_eq!(cache.metrics().hits_total(), 2);
        assert_eq!(cache.metrics().misses_total(), 1);
    }
}
