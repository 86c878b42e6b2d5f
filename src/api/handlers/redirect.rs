//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look the code up in the cache, then in the durable store on a miss
/// 2. Repopulate the cache after a store hit
/// 3. Queue a click event for the background worker
/// 4. Return 307 Temporary Redirect
///
/// The click is counted asynchronously; the redirect never waits for it.
///
/// # Errors
///
/// - 404 if the code is unknown or malformed
/// - 410 if the link has expired
/// - 503 if the cache misses and the durable store is unavailable
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.url_service.resolve(&code).await?;

    Ok((
        [
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        ],
        Redirect::temporary(&long_url),
    ))
}
