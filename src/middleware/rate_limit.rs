//! Fixed-window rate limiting per API key, backed by the shared cache.
//! Window = 60 s aligned to wall-clock minute, counter key
//! `rate_limit:<api_key>:<YYYY-MM-DD-HH-MM>`, non-atomic read-then-write
//! accepted as the cost of simplicity.

use crate::auth::middleware::ApiKey;
use crate::cache::Cache;
use crate::clock::Clock;
use crate::error::AppError;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Duration;

const WINDOW_SECONDS: u64 = 60;

#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>, limit: u32) -> Self {
        Self {
            cache,
            clock,
            limit,
        }
    }

    fn window_key(&self, api_key: &str) -> String {
        let now = self.clock.now();
        format!("rate_limit:{}:{}", api_key, now.format("%Y-%m-%d-%H-%M"))
    }

    /// Returns `Ok(())` if the request is admitted, incrementing the
    /// counter; `Err` carrying the current count if the limit was already
    /// reached.
    pub async fn check_and_increment(&self, api_key: &str) -> Result<(), AppError> {
        let key = self.window_key(api_key);

        let current_count: u32 = self
            .cache
            .get(&key)
            .await
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);

        if current_count >= self.limit {
            return Err(AppError::RateLimited {
                current_count,
                limit: self.limit,
                retry_after: WINDOW_SECONDS,
            });
        }

        self.cache
            .set(
                &key,
                &(current_count + 1).to_string(),
                Duration::from_secs(WINDOW_SECONDS),
            )
            .await;

        Ok(())
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .extensions()
        .get::<ApiKey>()
        .map(|key| key.0.clone())
        .ok_or(AppError::Unauthenticated)?;

    limiter.check_and_increment(&api_key).await?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::clock::FixedClock;

    fn limiter(limit: u32) -> RateLimiter {
        RateLimiter::new(
            Arc::new(InMemoryCache::new()),
            Arc::new(FixedClock::new(chrono::Utc::now())),
            limit,
        )
    }

    #[tokio::test]
    async fn admits_requests_up_to_the_limit() {
        let limiter = limiter(3);
        for _ in 0..3 {
            assert!(limiter.check_and_increment("key-a").await.is_ok());
        }
        assert!(limiter.check_and_increment("key-a").await.is_err());
    }

    #[tokio::test]
    async fn sixtieth_request_is_admitted_sixty_first_is_rejected() {
        let limiter = limiter(60);
        for _ in 0..60 {
            assert!(limiter.check_and_increment("key-a").await.is_ok());
        }
        let result = limiter.check_and_increment("key-a").await;
        match result {
            Err(AppError::RateLimited { current_count, limit, .. }) => {
                assert_eq!(current_count, 60);
                assert_eq!(limit, 60);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn counters_are_independent_per_api_key() {
        let limiter = limiter(1);
        assert!(limiter.check_and_increment("key-a").await.is_ok());
        assert!(limiter.check_and_increment("key-b").await.is_ok());
    }
}
