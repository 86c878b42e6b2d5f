//! Per-client sliding-window rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::application::rate_limit::{RateCategory, RateDecision};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_identity;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Picks the quota that applies to a request.
///
/// Returns `None` for paths that are never limited.
pub fn classify(method: &Method, path: &str) -> Option<RateCategory> {
    if path == "/health" {
        return None;
    }

    if method == Method::POST && path == "/shorten" {
        Some(RateCategory::Create)
    } else if path.starts_with("/stats/") {
        Some(RateCategory::Stats)
    } else if method == Method::GET {
        Some(RateCategory::Redirect)
    } else {
        Some(RateCategory::Default)
    }
}

/// Admits or rejects a request against its category quota.
///
/// # Key Extraction
///
/// The client is identified by peer address, or by the first
/// `X-Forwarded-For` / `X-Real-IP` entry when `BEHIND_PROXY` is enabled.
/// Each client has one independent window per [`RateCategory`].
///
/// # Headers
///
/// Every limited response carries `X-RateLimit-Limit`,
/// `X-RateLimit-Remaining` and `X-RateLimit-Reset`. Rejections answer
/// `429 Too Many Requests` with `Retry-After`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let Some(category) = classify(req.method(), req.uri().path()) else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(req.headers(), peer, st.behind_proxy);

    let rule = st.rate_limits.rule(category);
    let decision = st
        .rate_limiter
        .is_allowed(&category.key_for(&client), rule.limit, rule.window_seconds)
        .await;

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        tracing::info!(client = %client, category = %category, "Rate limit exceeded");
        metrics::counter!("rate_limited_total", "category" => category.as_str()).increment(1);
        AppError::RateLimited {
            retry_after: decision.reset_seconds,
        }
        .into_response()
    };

    insert_headers(response.headers_mut(), rule.limit, &decision);
    response
}

fn insert_headers(headers: &mut HeaderMap, limit: u32, decision: &RateDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_seconds));
}
