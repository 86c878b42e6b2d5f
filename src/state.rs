//! Shared application state injected into all HTTP handlers.

use std::sync::Arc;

use crate::application::rate_limit::{RateLimitTable, RateLimiter};
use crate::application::services::UrlService;
use crate::domain::click_event::ClickDispatcher;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::VolatileCache;

/// Application state shared across all request handlers.
///
/// Cloned per request; every field is either `Arc`-wrapped or cheap to copy.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    /// Durable store, used directly only by the health check.
    pub repository: Arc<dyn UrlRepository>,
    pub cache: Arc<VolatileCache>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub rate_limits: RateLimitTable,
    pub clicks: ClickDispatcher,
    /// Prefix for `short_url` in responses, without a trailing slash.
    pub base_url: String,
    pub default_ttl_days: u32,
    pub max_ttl_days: u32,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the URL service from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<VolatileCache>,
        rate_limiter: Arc<dyn RateLimiter>,
        rate_limits: RateLimitTable,
        clicks: ClickDispatcher,
        base_url: impl Into<String>,
        default_ttl_days: u32,
        behind_proxy: bool,
    ) -> Self {
        let url_service = Arc::new(UrlService::new(
            repository.clone(),
            cache.clone(),
            clicks.clone(),
        ));

        Self {
            url_service,
            repository,
            cache,
            rate_limiter,
            rate_limits,
            clicks,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_ttl_days,
            max_ttl_days: crate::config::TTL_DAYS_CEILING,
            behind_proxy,
        }
    }

    /// Lowers the longest lifetime a request may ask for.
    pub fn with_max_ttl_days(mut self, max_ttl_days: u32) -> Self {
        self.max_ttl_days = max_ttl_days;
        self
    }

    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }
}
