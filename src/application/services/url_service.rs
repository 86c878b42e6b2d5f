//! URL creation, resolution and statistics service.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info};

use crate::config::TTL_DAYS_CEILING;
use crate::domain::click_event::ClickDispatcher;
use crate::domain::entities::{DedupEntry, UrlRecord, UrlStats};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::infrastructure::cache::VolatileCache;
use crate::utils::code_generator::{
    generate_code, generate_fallback_code, is_valid_short_code, sanitize_owner_id, url_hash,
    validate_custom_code,
};
use crate::utils::url_normalizer::normalize_url;

/// Input for [`UrlService::create_short_url`].
#[derive(Debug, Clone, Default)]
pub struct CreateShortUrl {
    /// Already screened by [`crate::utils::url_safety::check_url_safety`].
    pub long_url: String,
    pub custom_alias: Option<String>,
    pub owner_id: Option<String>,
    /// `None` creates a record that never expires.
    pub ttl_days: Option<u32>,
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenedUrl {
    pub short_code: String,
    pub long_url: String,
}

/// Service orchestrating short code generation, deduplication, caching and
/// click accounting.
///
/// The durable repository is authoritative. The cache only ever holds
/// disposable projections of it and is repaired lazily on misses.
pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    cache: Arc<VolatileCache>,
    clicks: ClickDispatcher,
}

impl UrlService {
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        cache: Arc<VolatileCache>,
        clicks: ClickDispatcher,
    ) -> Self {
        Self {
            repository,
            cache,
            clicks,
        }
    }

    /// Creates (or finds) the short code for a URL.
    ///
    /// # Deduplication
    ///
    /// Inputs that normalize to the same URL share a dedup digest. A known
    /// digest returns the code first minted for it, found in the cache or, on
    /// a cache miss, in the durable store (which then repairs the cache).
    ///
    /// # Code Selection
    ///
    /// - With `custom_alias`: the alias is used as-is, or [`AppError::AliasTaken`]
    /// - Otherwise: [`generate_code`], then one [`generate_fallback_code`] retry
    ///   on collision, then [`AppError::GenerationExhausted`]
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] for unparseable URLs, bad aliases or
    /// a `ttl_days` above [`TTL_DAYS_CEILING`] (before any I/O), and [`AppError::BackendUnavailable`] when the durable
    /// store fails.
    pub async fn create_short_url(&self, request: CreateShortUrl) -> Result<ShortenedUrl, AppError> {
        let long_url = normalize_url(&request.long_url).map_err(|e| {
            AppError::invalid_input("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(alias) = request.custom_alias.as_deref() {
            validate_custom_code(alias)?;
        }

        if let Some(ttl_days) = request.ttl_days
            && ttl_days > TTL_DAYS_CEILING
        {
            return Err(AppError::invalid_input(
                "ttl_days out of range",
                json!({ "ttl_days": ttl_days, "max": TTL_DAYS_CEILING }),
            ));
        }

        let hash = url_hash(&long_url);

        if let Some(short_code) = self.cache.get_dedup(&hash).await {
            debug!(short_code = %short_code, "Dedup cache hit");
            return Ok(ShortenedUrl {
                short_code,
                long_url,
            });
        }

        if let Some(short_code) = self.repository.find_dedup(&hash).await? {
            debug!(short_code = %short_code, "Dedup store hit, repairing cache");
            self.cache.set_dedup(&hash, &short_code).await;
            return Ok(ShortenedUrl {
                short_code,
                long_url,
            });
        }

        let owner_id = request.owner_id.as_deref().and_then(sanitize_owner_id);
        let record = self
            .insert_unique(
                request.custom_alias.as_deref(),
                &long_url,
                request.ttl_days,
                owner_id,
            )
            .await?;

        self.repository
            .insert_dedup(&DedupEntry::new(
                hash.clone(),
                record.short_code.clone(),
                record.created_at,
            ))
            .await?;

        self.cache
            .set_url(
                &record.short_code,
                &record.long_url,
                record.remaining_lifetime(Utc::now()),
            )
            .await;
        self.cache.set_dedup(&hash, &record.short_code).await;

        info!(short_code = %record.short_code, "Short URL created");

        Ok(ShortenedUrl {
            short_code: record.short_code,
            long_url: record.long_url,
        })
    }

    /// Resolves a short code and schedules a click increment.
    ///
    /// The increment is queued, not awaited: the caller gets the URL as soon as
    /// it is known.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] for unknown codes and for syntactically invalid ones
    /// - [`AppError::Expired`] for records past their expiry (also evicted from cache)
    /// - [`AppError::BackendUnavailable`] on a cache miss with the store down
    pub async fn resolve(&self, short_code: &str) -> Result<String, AppError> {
        if !is_valid_short_code(short_code) {
            return Err(AppError::NotFound);
        }

        if let Some(long_url) = self.cache.get_url(short_code).await {
            debug!(short_code, "URL cache hit");
            self.clicks.dispatch(short_code);
            return Ok(long_url);
        }

        let record = self
            .repository
            .find_by_code(short_code)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = Utc::now();
        if record.is_expired_at(now) {
            self.cache.delete_url(short_code).await;
            return Err(AppError::Expired);
        }

        self.cache
            .set_url(short_code, &record.long_url, record.remaining_lifetime(now))
            .await;
        self.clicks.dispatch(short_code);

        Ok(record.long_url)
    }

    /// Reads a record and its click count straight from the durable store.
    ///
    /// Expired records still report their statistics.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] under the same rules as [`Self::resolve`].
    pub async fn get_stats(&self, short_code: &str) -> Result<UrlStats, AppError> {
        if !is_valid_short_code(short_code) {
            return Err(AppError::NotFound);
        }

        let record = self
            .repository
            .find_by_code(short_code)
            .await?
            .ok_or(AppError::NotFound)?;

        let clicks = self.repository.get_clicks(short_code).await?;

        Ok(UrlStats {
            short_code: record.short_code,
            long_url: record.long_url,
            clicks,
            expires_at: record.expires_at,
        })
    }

    /// Writes a new record under the alias or a freshly generated code.
    async fn insert_unique(
        &self,
        alias: Option<&str>,
        long_url: &str,
        ttl_days: Option<u32>,
        owner_id: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        let mut short_code = match alias {
            Some(alias) => alias.to_string(),
            None => generate_code(long_url),
        };
        let mut fallback_used = false;

        loop {
            let record = UrlRecord::new(
                short_code,
                long_url.to_string(),
                Utc::now(),
                ttl_days,
                owner_id.clone(),
            );

            if self.try_claim(&record).await? {
                return Ok(record);
            }

            if let Some(alias) = alias {
                return Err(AppError::AliasTaken {
                    alias: alias.to_string(),
                });
            }

            if fallback_used {
                error!(short_code = %record.short_code, "Fallback short code collided");
                return Err(AppError::GenerationExhausted);
            }

            debug!(short_code = %record.short_code, "Generated code collided, using fallback");
            short_code = generate_fallback_code();
            fallback_used = true;
        }
    }

    /// Existence check followed by an insert-if-absent.
    ///
    /// The insert settles races that slip past the check.
    async fn try_claim(&self, record: &UrlRecord) -> Result<bool, AppError> {
        if self
            .repository
            .find_by_code(&record.short_code)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        self.repository.insert_url(record).await
    }
}
