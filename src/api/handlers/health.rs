//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: The durable store answers. A down cache only marks its
///   own check and the overall status as `degraded`.
/// - **503 Service Unavailable**: The durable store is unreachable
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` through the repository
/// 2. **Cache**: PING, which also refreshes the cache availability flag
/// 3. **Click Queue**: Checks if channel is open and reports free capacity
/// 4. **Rate Limiter**: Reports which limiter is active
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "Redis connected" },
///     "click_queue": { "status": "ok", "message": "Capacity: 10000" },
///     "rate_limiter": { "status": "ok", "message": "distributed" }
///   }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_check = check_database(&state).await;
    let cache_check = check_cache(&state).await;
    let queue_check = check_click_queue(&state);
    let limiter_check = CheckStatus::new("ok", Some(state.rate_limiter.variant().to_string()));

    let store_up = db_check.status == "ok";
    let all_ok = store_up
        && queue_check.status == "ok"
        && matches!(cache_check.status.as_str(), "ok" | "disabled");

    let status = match (store_up, all_ok) {
        (false, _) => "unhealthy",
        (true, false) => "degraded",
        (true, true) => "healthy",
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            cache: cache_check,
            click_queue: queue_check,
            rate_limiter: limiter_check,
        },
    };

    let code = if store_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}

/// Checks database connectivity.
async fn check_database(state: &AppState) -> CheckStatus {
    match state.repository.ping().await {
        Ok(()) => CheckStatus::new("ok", Some("Connected".to_string())),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            CheckStatus::new("error", Some("Database unreachable".to_string()))
        }
    }
}

/// Checks cache connectivity via PING command.
async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.backend().is_none() {
        return CheckStatus::new("disabled", Some("No cache configured".to_string()));
    }

    if state.cache.probe().await {
        CheckStatus::new("ok", Some("Redis connected".to_string()))
    } else {
        CheckStatus::new("degraded", Some("Redis connection failed".to_string()))
    }
}

/// Checks if the click tracking queue is operational.
fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.clicks.is_closed() {
        CheckStatus::new("error", Some("Click queue is closed".to_string()))
    } else {
        CheckStatus::new("ok", Some(format!("Capacity: {}", state.clicks.capacity())))
    }
}
