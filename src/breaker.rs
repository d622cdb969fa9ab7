//! Per-vendor circuit breaker: a consecutive-failure counter and
//! cooldown-until-instant pair driving a three-state CLOSED/OPEN/HALF_OPEN
//! machine with single-admission probing while half-open.

use crate::clock::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// A probe is already in flight; this caller must not proceed.
    ProbeInFlight,
    Rejected,
}

struct BreakerInner {
    consecutive_failures: u32,
    opened_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Set while a half-open probe has been admitted and hasn't reported
    /// back yet, so concurrent callers don't all pile in as probes.
    probe_in_flight: bool,
}

impl Default for BreakerInner {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// A single vendor's breaker. Cheap to lock: the critical section never
/// awaits.
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    pub fn state(&self, clock: &dyn Clock) -> BreakerState {
        let guard = self.inner.lock();
        self.state_locked(&guard, clock)
    }

    fn state_locked(&self, guard: &BreakerInner, clock: &dyn Clock) -> BreakerState {
        match guard.opened_at {
            None => BreakerState::Closed,
            Some(opened_at) => {
                let elapsed = clock
                    .now()
                    .signed_duration_since(opened_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.cooldown {
                    BreakerState::HalfOpen
                } else {
                    BreakerState::Open
                }
            }
        }
    }

    /// Decides whether a call may proceed right now, atomically claiming
    /// the single half-open probe slot if that's the state.
    pub fn try_admit(&self, clock: &dyn Clock) -> Admission {
        let mut guard = self.inner.lock();
        match self.state_locked(&guard, clock) {
            BreakerState::Closed => Admission::Allowed,
            BreakerState::Open => Admission::Rejected,
            BreakerState::HalfOpen => {
                if guard.probe_in_flight {
                    Admission::ProbeInFlight
                } else {
                    guard.probe_in_flight = true;
                    Admission::Allowed
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut guard = self.inner.lock();
        guard.consecutive_failures = 0;
        guard.opened_at = None;
        guard.probe_in_flight = false;
    }

    pub fn record_failure(&self, clock: &dyn Clock) {
        let mut guard = self.inner.lock();
        guard.probe_in_flight = false;

        // A failed half-open probe re-opens the breaker for a fresh cooldown
        // regardless of the raw failure count.
        if guard.opened_at.is_some() {
            guard.opened_at = Some(clock.now());
            return;
        }

        guard.consecutive_failures += 1;
        if guard.consecutive_failures >= self.threshold {
            guard.opened_at = Some(clock.now());
        }
    }
}

/// One breaker per vendor, created lazily on first use.
pub struct BreakerRegistry {
    threshold: u32,
    cooldown: Duration,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, vendor_name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(vendor_name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.threshold, self.cooldown)))
            .clone()
    }
}
