//! API route configuration.

use crate::api::handlers::{redirect_handler, shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Rate-limited public routes.
///
/// # Endpoints
///
/// - `POST /shorten`       - Create (or deduplicate) a short URL
/// - `GET  /stats/{code}`  - Click statistics for a short code
/// - `GET  /{code}`        - Redirect to the original URL
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/stats/{code}", get(stats_handler))
        .route("/{code}", get(redirect_handler))
}
