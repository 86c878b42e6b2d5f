//! Handler for link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::CreateShortUrl;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::url_safety::check_url_safety;

/// Creates a short URL, or returns the existing one for a known URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_alias": "my-link",   // optional
///   "user_id": "team-42",        // optional
///   "ttl_days": 30               // optional, configured default otherwise
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "aB3dE5fG",
///   "short_url": "http://localhost:3000/aB3dE5fG",
///   "long_url": "https://example.com/some/long/path"
/// }
/// ```
///
/// # Errors
///
/// - 400 if validation, the `MAX_TTL_DAYS` bound or the URL safety screen fails
/// - 409 if `custom_alias` is already taken
/// - 503 if the durable store is unavailable
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let ttl_days = payload.ttl_days.unwrap_or(state.default_ttl_days);
    if ttl_days > state.max_ttl_days {
        return Err(AppError::invalid_input(
            "Validation failed",
            json!({ "ttl_days": format!("must be at most {}", state.max_ttl_days) }),
        ));
    }

    let long_url = check_url_safety(&payload.url).map_err(|e| {
        AppError::invalid_input("URL rejected", json!({ "url": e.to_string() }))
    })?;

    let created = state
        .url_service
        .create_short_url(CreateShortUrl {
            long_url,
            custom_alias: payload.custom_alias,
            owner_id: payload.user_id,
            ttl_days: Some(ttl_days),
        })
        .await?;

    let short_url = state.short_url(&created.short_code);

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_code: created.short_code,
            short_url,
            long_url: created.long_url,
        }),
    ))
}
