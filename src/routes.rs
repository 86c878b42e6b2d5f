//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /shorten`       - Create a short URL (rate limited: create)
//! - `GET  /stats/{code}`  - Statistics (rate limited: stats)
//! - `GET  /{code}`        - Redirect (rate limited: redirect)
//! - `GET  /health`        - Health check: DB, cache, click queue (never limited)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client sliding window per category
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Whether the limiter trusts proxy headers is read from
/// [`AppState::behind_proxy`].
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
pub fn router(state: AppState) -> Router {
    let limited = api::routes::public_routes()
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));

    Router::new()
        .route("/health", get(health_handler))
        .merge(limited)
        .with_state(state)
        .layer(tracing::layer())
}
