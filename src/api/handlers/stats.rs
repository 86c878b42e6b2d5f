//! Handler for link statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click count and metadata for a short code.
///
/// # Endpoint
///
/// `GET /stats/{code}`
///
/// Read from the durable store only. Expired links still report their
/// counters.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.url_service.get_stats(&code).await?;

    Ok(Json(stats.into()))
}
