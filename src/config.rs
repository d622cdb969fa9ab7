//! Application configuration. `Config::from_env()` parses CLI flags with
//! environment-variable fallback via `clap`'s `derive`+`env` features — a
//! flag wins over its named environment variable, which wins over the
//! compiled-in default.

use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "vendor-aggregator",
    about = "Concurrent vendor aggregation and resilience engine"
)]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Default TTL for cached records (seconds). The aggregator overrides
    /// this with `product_cache_ttl_seconds` for product records.
    #[arg(long = "cache-ttl", env = "CACHE_TTL", default_value_t = 60)]
    pub cache_ttl_seconds: u64,

    #[arg(long, env = "PRODUCT_CACHE_TTL_SECONDS", default_value_t = 120)]
    pub product_cache_ttl_seconds: u64,

    #[arg(long, env = "FRESHNESS_WINDOW_SECONDS", default_value_t = 600)]
    pub freshness_window_seconds: u64,

    #[arg(long, env = "VENDOR_TIMEOUT_SECONDS", default_value_t = 2)]
    pub vendor_timeout_seconds: u64,

    #[arg(long, env = "VENDOR_RETRIES", default_value_t = 2)]
    pub vendor_retries: u32,

    /// Overall per-request deadline (seconds). Bounds the whole vendor
    /// fan-out, independent of individual per-vendor timeouts and retries.
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 5)]
    pub request_timeout_seconds: u64,

    #[arg(long, env = "BREAKER_THRESHOLD", default_value_t = 3)]
    pub breaker_threshold: u32,

    #[arg(long, env = "BREAKER_COOLDOWN_SECONDS", default_value_t = 30)]
    pub breaker_cooldown_seconds: u64,

    #[arg(long, env = "RATE_LIMIT_PER_MINUTE", default_value_t = 60)]
    pub rate_limit_per_minute: u32,

    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: u8,

    #[arg(long, env = "REDIS_PASSWORD")]
    pub redis_password: Option<String>,

    #[arg(long, env = "REDIS_POOL_SIZE", default_value_t = 10)]
    pub redis_pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            cache_ttl_seconds: 60,
            product_cache_ttl_seconds: 120,
            freshness_window_seconds: 600,
            vendor_timeout_seconds: 2,
            vendor_retries: 2,
            request_timeout_seconds: 5,
            breaker_threshold: 3,
            breaker_cooldown_seconds: 30,
            rate_limit_per_minute: 60,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            redis_password: None,
            redis_pool_size: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::parse()
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_seconds)
    }

    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_secs(self.vendor_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_seconds)
    }

    pub fn redis_url(&self) -> String {
        match &self.redis_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis_host, self.redis_port, self.redis_db
            ),
            None => format!(
                "redis://{}:{}/{}",
                self.redis_host, self.redis_port, self.redis_db
            ),
        }
    }
}
