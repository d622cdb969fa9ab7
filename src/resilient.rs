//! Resilient caller: composes the breaker gate, a per-attempt timeout, and
//! bounded linear-backoff retry around a fetcher+normalizer pair. Holds the
//! breaker behind the call rather than inside the fetcher, so the fetcher
//! stays a plain request/response abstraction.

use crate::breaker::{Admission, CircuitBreaker};
use crate::clock::Clock;
use crate::normalize::{normalize, NormalizedRecord};
use crate::vendor::{FetchOutcome, VendorFetcher};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ResilientCaller<F> {
    fetcher: F,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
    retries: u32,
    freshness_window: Duration,
}

impl<F: VendorFetcher> ResilientCaller<F> {
    pub fn new(
        fetcher: F,
        breaker: Arc<CircuitBreaker>,
        timeout: Duration,
        retries: u32,
        freshness_window: Duration,
    ) -> Self {
        Self {
            fetcher,
            breaker,
            timeout,
            retries,
            freshness_window,
        }
    }

    /// Runs the full resilience chain for one vendor. Never returns an
    /// error: every failure mode collapses to `None`.
    pub async fn call(
        &self,
        sku: &str,
        cancel: CancellationToken,
        clock: &dyn Clock,
    ) -> Option<NormalizedRecord> {
        match self.breaker.try_admit(clock) {
            Admission::Rejected | Admission::ProbeInFlight => {
                debug!(vendor = self.fetcher.name(), "breaker_rejected");
                return None;
            }
            Admission::Allowed => {}
        }

        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let outcome = self.attempt_once(sku, &cancel).await;

            match outcome {
                FetchOutcome::NotFound => {
                    self.breaker.record_success();
                    return None;
                }
                FetchOutcome::Cancelled => {
                    return None;
                }
                FetchOutcome::Record(raw) => match normalize(&raw, self.freshness_window, clock) {
                    Ok(mut record) => {
                        record.vendor_name = self.fetcher.name().to_string();
                        self.breaker.record_success();
                        return Some(record);
                    }
                    Err(reason) => {
                        debug!(
                            vendor = self.fetcher.name(),
                            ?reason, "record_rejected_by_normalizer"
                        );
                        // A normalizer rejection is not a vendor failure: the
                        // vendor answered, the data just didn't qualify.
                        self.breaker.record_success();
                        return None;
                    }
                },
                FetchOutcome::Error(err) => {
                    warn!(vendor = self.fetcher.name(), attempt, error = %err, "vendor_call_failed");
                    self.breaker.record_failure(clock);

                    if attempt >= self.retries {
                        return None;
                    }

                    attempt += 1;
                    let backoff = Duration::from_millis(100 * attempt as u64);
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancel.cancelled() => return None,
                    }
                }
            }
        }
    }

    async fn attempt_once(&self, sku: &str, cancel: &CancellationToken) -> FetchOutcome {
        let fetch = self.fetcher.fetch(sku, cancel.child_token());
        tokio::select! {
            outcome = fetch => outcome,
            _ = tokio::time::sleep(self.timeout) => {
                FetchOutcome::Error(anyhow::anyhow!("{}: attempt timed out", self.fetcher.name()))
            }
            _ = cancel.cancelled() => FetchOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::BreakerState;
    use crate::clock::FixedClock;
    use crate::vendor::catalog::{IntegerInventoryEntry, IntegerInventoryFetcher};
    use crate::vendor::flaky::FlakyFetcher;
    use std::collections::HashMap;

    fn catalog_with(sku: &str, price: f64, count: i64) -> HashMap<String, IntegerInventoryEntry> {
        let mut map = HashMap::new();
        map.insert(
            sku.to_string(),
            IntegerInventoryEntry {
                inventory_count: Some(count),
                unit_price: price,
                availability_status: "IN_STOCK".to_string(),
                last_updated: chrono::Utc::now(),
            },
        );
        map
    }

    #[tokio::test]
    async fn successful_fetch_returns_a_record_and_resets_breaker() {
        let clock = FixedClock::new(chrono::Utc::now());
        let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(30)));
        let fetcher = IntegerInventoryFetcher::new("VendorA", catalog_with("SKU001", 10.0, 5));
        let caller = ResilientCaller::new(
            fetcher,
            breaker.clone(),
            Duration::from_secs(2),
            2,
            Duration::from_secs(600),
        );

        let record = caller
            .call("SKU001", CancellationToken::new(), &clock)
            .await;
        assert!(record.is_some());
        assert_eq!(breaker.state(&clock), BreakerState::Closed);
    }

    #[tokio::test]
    async fn not_found_is_not_retried_and_not_treated_as_failure() {
        let clock = FixedClock::new(chrono::Utc::now());
        let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(30)));
        let fetcher = IntegerInventoryFetcher::new("VendorA", HashMap::new());
        let caller = ResilientCaller::new(
            fetcher,
            breaker.clone(),
            Duration::from_secs(2),
            2,
            Duration::from_secs(600),
        );

        let record = caller
            .call("MISSING", CancellationToken::new(), &clock)
            .await;
        assert!(record.is_none());
        assert_eq!(breaker.state(&clock), BreakerState::Closed);
    }

    #[tokio::test]
    async fn exhausted_retries_open_the_breaker_after_threshold() {
        let clock = FixedClock::new(chrono::Utc::now());
        let breaker = Arc::new(CircuitBreaker::new(3, Duration::from_secs(30)));
        let fetcher = FlakyFetcher::new(
            IntegerInventoryFetcher::new("VendorC", HashMap::new()),
            Duration::from_millis(0),
            Duration::from_millis(1),
            1.0,
            7,
        );
        let caller = ResilientCaller::new(
            fetcher,
            breaker.clone(),
            Duration::from_secs(2),
            2,
            Duration::from_secs(600),
        );

        let record = caller
            .call("SKU001", CancellationToken::new(), &clock)
            .await;
        assert!(record.is_none());
        // 1 initial attempt + 2 retries = 3 consecutive failures.
        assert_eq!(breaker.state(&clock), BreakerState::Open);
    }

    #[tokio::test]
    async fn open_breaker_skips_the_fetcher_entirely() {
        let clock = FixedClock::new(chrono::Utc::now());
        let breaker = Arc::new(CircuitBreaker::new(1, Duration::from_secs(30)));
        breaker.record_failure(&clock);
        assert_eq!(breaker.state(&clock), BreakerState::Open);

        let fetcher = IntegerInventoryFetcher::new("VendorA", catalog_with("SKU001", 10.0, 5));
        let caller = ResilientCaller::new(
            fetcher,
            breaker.clone(),
            Duration::from_secs(2),
            2,
            Duration::from_secs(600),
        );

        let record = caller
            .call("SKU001", CancellationToken::new(), &clock)
            .await;
        assert!(record.is_none());
    }
}
