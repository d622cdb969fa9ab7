//! Vendor aggregation service entry point: wires config, cache, vendor
//! fetchers, and the HTTP surface together and serves them.

use anyhow::{Context, Result};
use axum::{middleware as axum_mw, routing::get, Router};
use dotenv::dotenv;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vendor_aggregator::{
    aggregator::{Aggregator, AggregatorConfig},
    api,
    auth::auth_middleware,
    breaker::BreakerRegistry,
    cache::{Cache, InMemoryCache, RedisCache},
    clock::{Clock, SystemClock},
    config::Config,
    middleware::{rate_limit_middleware, request_logging, RateLimiter},
    vendor::{
        catalog::{
            BooleanInStockEntry, BooleanInStockFetcher, IntegerInventoryEntry,
            IntegerInventoryFetcher, StringQuantityEntry, StringQuantityFetcher,
        },
        flaky::FlakyFetcher,
        VendorFetcher,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    info!(port = config.port, "vendor-aggregator starting");

    let cache: Arc<dyn Cache> = match RedisCache::connect(&config).await {
        Ok(redis) => {
            info!("connected to redis cache backend");
            Arc::new(redis)
        }
        Err(err) => {
            tracing::warn!(error = %err, "redis unavailable, falling back to in-memory cache");
            Arc::new(InMemoryCache::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let breakers = Arc::new(BreakerRegistry::new(
        config.breaker_threshold,
        config.breaker_cooldown(),
    ));

    let fetchers: Vec<Arc<dyn VendorFetcher>> = build_demo_fetchers();

    let aggregator = Aggregator::new(
        fetchers,
        breakers,
        cache.clone(),
        clock.clone(),
        AggregatorConfig {
            product_cache_ttl: Duration::from_secs(config.product_cache_ttl_seconds),
            vendor_timeout: config.vendor_timeout(),
            vendor_retries: config.vendor_retries,
            freshness_window: config.freshness_window(),
        },
    );

    let rate_limiter = RateLimiter::new(cache.clone(), clock.clone(), config.rate_limit_per_minute);

    let state = Arc::new(AppState {
        aggregator,
        request_timeout: config.request_timeout(),
    });

    let protected_routes = Router::new()
        .route("/products/:sku", get(api::get_product))
        .layer(axum_mw::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .layer(axum_mw::from_fn(auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(api::health))
        .route("/", get(api::service_descriptor));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

/// Seeds the three vendor shapes with a small illustrative catalog. A real
/// deployment would instead construct `HttpVendorFetcher`s pointed at
/// actual vendor endpoints.
fn build_demo_fetchers() -> Vec<Arc<dyn VendorFetcher>> {
    let now = chrono::Utc::now();

    let mut vendor_a_catalog = HashMap::new();
    vendor_a_catalog.insert(
        "DEMO0001".to_string(),
        IntegerInventoryEntry {
            inventory_count: Some(12),
            unit_price: 149.99,
            availability_status: "IN_STOCK".to_string(),
            last_updated: now,
        },
    );
    let vendor_a = Arc::new(IntegerInventoryFetcher::new("VendorA", vendor_a_catalog));

    let mut vendor_b_catalog = HashMap::new();
    vendor_b_catalog.insert(
        "DEMO0001".to_string(),
        BooleanInStockEntry {
            stock_level: Some(3),
            price_usd: "155.00".to_string(),
            in_stock: true,
            updated_at: now,
        },
    );
    let vendor_b = Arc::new(BooleanInStockFetcher::new("VendorB", vendor_b_catalog));

    let mut vendor_c_catalog = HashMap::new();
    vendor_c_catalog.insert(
        "DEMO0001".to_string(),
        StringQuantityEntry {
            qty: Some("7".to_string()),
            cost: 151.50,
            available: "yes".to_string(),
            updated_at: now,
        },
    );
    let vendor_c = Arc::new(FlakyFetcher::new(
        StringQuantityFetcher::new("VendorC", vendor_c_catalog),
        Duration::from_millis(50),
        Duration::from_millis(400),
        0.1,
        0x9E3779B97F4A7C15,
    ));

    vec![vendor_a, vendor_b, vendor_c]
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vendor_aggregator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
