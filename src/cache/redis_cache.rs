//! Redis-backed cache, pooled via `deadpool-redis` (bounded connection pool,
//! default size 10). Any Redis-compatible store works.
//!
//! Every operation swallows its own errors: a failure is logged at `warn`
//! and treated as a miss/no-op rather than propagated.

use super::{Cache, CacheMetrics};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

pub struct RedisCache {
    pool: Pool,
    metrics: CacheMetrics,
}

impl RedisCache {
    /// Builds the pool and verifies reachability with a PING before serving
    /// traffic.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool_config = PoolConfig::from_url(config.redis_url());
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .context("failed to build redis connection pool")?;

        let mut conn = pool.get().await.context("failed to acquire redis connection")?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("redis PING failed at startup")?;

        Ok(Self {
            pool,
            metrics: CacheMetrics::default(),
        })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, key, "redis pool exhausted on get, treating as miss");
                self.metrics.record(false);
                return None;
            }
        };

        let result = match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, key, "redis GET failed, treating as miss");
                None
            }
        };
        self.metrics.record(result.is_some());
        result
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, key, "redis pool exhausted on set, dropping write");
                return;
            }
        };

        let ttl_secs = ttl.as_secs().max(1);
        if let Err(err) = conn
            .set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
        {
            warn!(error = %err, key, "redis SET failed");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, key, "redis pool exhausted on delete");
                return;
            }
        };

        if let Err(err) = conn.del::<_, ()>(key).await {
            warn!(error = %err, key, "redis DEL failed");
        }
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, key, "redis pool exhausted on exists");
                return false;
            }
        };

        conn.exists(key).await.unwrap_or(false)
    }

    async fn scan_delete(&self, pattern: &str) {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, pattern, "redis pool exhausted on scan_delete");
                return;
            }
        };

        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, pattern, "redis KEYS failed");
                return;
            }
        };

        if keys.is_empty() {
            return;
        }

        if let Err(err) = conn.del::<_, ()>(keys).await {
            warn!(error = %err, pattern, "redis bulk DEL failed");
        }
    }

    fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}
