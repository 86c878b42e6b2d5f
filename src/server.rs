//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::rate_limit::{
    DistributedRateLimiter, RateLimiter, StandaloneRateLimiter,
};
use crate::config::Config;
use crate::domain::click_event::ClickDispatcher;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::VolatileCache;
use crate::infrastructure::persistence::PgUrlRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or an unavailable cache when Redis is absent)
/// - Rate limiter: distributed over Redis, standalone otherwise
/// - Background click worker and cache health prober
/// - Axum HTTP server with graceful shutdown on Ctrl-C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let settings = config.cache_settings();
    let cache = Arc::new(VolatileCache::connect(config.redis_url.as_deref(), settings).await);

    let rate_limiter: Arc<dyn RateLimiter> = match cache.backend() {
        Some(backend) => {
            tracing::info!("Rate limiter: distributed (Redis)");
            Arc::new(DistributedRateLimiter::new(backend, settings.op_timeout))
        }
        None => {
            tracing::info!("Rate limiter: standalone (in-process)");
            Arc::new(StandaloneRateLimiter::new())
        }
    };

    let repository: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(
        Arc::new(pool.clone()),
        Duration::from_secs(config.db_query_timeout),
    ));

    let (clicks, click_rx) = ClickDispatcher::channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        repository.clone(),
        config.click_worker_concurrency,
    ));
    tracing::info!("Click worker started");

    let prober = tokio::spawn(probe_cache(
        cache.clone(),
        Duration::from_secs(config.cache_probe_interval_seconds),
    ));

    let state = AppState::new(
        repository,
        cache,
        rate_limiter,
        config.rate_limits,
        clicks,
        config.base_url.clone(),
        config.default_ttl_days,
        config.behind_proxy,
    )
    .with_max_ttl_days(config.max_ttl_days);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router, and with it every click sender, is gone once serve returns.
    prober.abort();
    tracing::info!("Draining click queue");
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Click worker terminated abnormally");
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Periodically pings the cache so the availability flag follows reality.
async fn probe_cache(cache: Arc<VolatileCache>, every: Duration) {
    if cache.backend().is_none() {
        return;
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        cache.probe().await;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
