//! Best-effort cache facade used by the service layer.
//!
//! Wraps a [`CacheService`] backend and guarantees that no cache failure ever
//! reaches a caller: reads degrade to misses, writes to no-ops, and every
//! operation is bounded by a short timeout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::redis_cache::RedisCache;
use super::service::{CacheError, CacheResult, CacheService};

/// Key namespace for `short_code -> long_url` projections.
pub const URL_PREFIX: &str = "url:";
/// Key namespace for `url_hash -> short_code` projections.
pub const DEDUP_PREFIX: &str = "dedup:";
/// Key namespace for sliding-window rate limit state.
pub const RATE_LIMIT_PREFIX: &str = "ratelimit:";

/// Cache timing parameters.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Upper bound on how long a URL projection lives.
    pub url_ttl: Duration,
    pub dedup_ttl: Duration,
    /// Applied to every individual cache call.
    pub op_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url_ttl: Duration::from_secs(3600),
            dedup_ttl: Duration::from_secs(86_400),
            op_timeout: Duration::from_secs(2),
        }
    }
}

/// Whether a cache backend was obtained at startup.
#[derive(Clone)]
pub enum CacheHandle {
    Available(Arc<dyn CacheService>),
    Unavailable,
}

/// Cache facade with explicit availability state.
///
/// Availability is fixed by the [`CacheHandle`] at construction and then only
/// changed by [`VolatileCache::probe`]. While marked unhealthy, operations
/// short-circuit without touching the backend.
pub struct VolatileCache {
    handle: CacheHandle,
    healthy: AtomicBool,
    settings: CacheSettings,
}

impl VolatileCache {
    pub fn new(handle: CacheHandle, settings: CacheSettings) -> Self {
        let healthy = matches!(handle, CacheHandle::Available(_));
        Self {
            handle,
            healthy: AtomicBool::new(healthy),
            settings,
        }
    }

    pub fn unavailable(settings: CacheSettings) -> Self {
        Self::new(CacheHandle::Unavailable, settings)
    }

    /// Connects to Redis when a URL is configured.
    ///
    /// A missing URL or a failed connection yields an unavailable cache; the
    /// service keeps running against the durable store alone.
    pub async fn connect(redis_url: Option<&str>, settings: CacheSettings) -> Self {
        let Some(redis_url) = redis_url else {
            info!("REDIS_URL not set, running without cache");
            return Self::unavailable(settings);
        };

        match tokio::time::timeout(settings.op_timeout * 5, RedisCache::connect(redis_url)).await {
            Ok(Ok(cache)) => Self::new(CacheHandle::Available(Arc::new(cache)), settings),
            Ok(Err(e)) => {
                warn!(error = %e, "Redis unavailable, running without cache");
                Self::unavailable(settings)
            }
            Err(_) => {
                warn!("Redis connection timed out, running without cache");
                Self::unavailable(settings)
            }
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// True if a backend exists and the last probe (or startup) found it healthy.
    pub fn is_available(&self) -> bool {
        matches!(self.handle, CacheHandle::Available(_)) && self.healthy.load(Ordering::Relaxed)
    }

    /// The raw backend, if one was obtained at startup.
    pub fn backend(&self) -> Option<Arc<dyn CacheService>> {
        match &self.handle {
            CacheHandle::Available(backend) => Some(backend.clone()),
            CacheHandle::Unavailable => None,
        }
    }

    /// Pings the backend and updates availability.
    pub async fn probe(&self) -> bool {
        let CacheHandle::Available(backend) = &self.handle else {
            return false;
        };

        let result = tokio::time::timeout(self.settings.op_timeout, backend.ping())
            .await
            .unwrap_or(Err(CacheError::Timeout));
        if let Err(e) = &result {
            debug!(error = %e, "Cache probe failed");
        }
        let healthy = result.is_ok();

        let was_healthy = self.healthy.swap(healthy, Ordering::Relaxed);
        match (was_healthy, healthy) {
            (true, false) => warn!("Cache became unavailable"),
            (false, true) => info!("Cache available again"),
            _ => {}
        }

        healthy
    }

    fn live_backend(&self) -> Option<&Arc<dyn CacheService>> {
        match &self.handle {
            CacheHandle::Available(backend) if self.healthy.load(Ordering::Relaxed) => {
                Some(backend)
            }
            _ => None,
        }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        fut: impl Future<Output = CacheResult<T>>,
    ) -> Option<T> {
        let result = tokio::time::timeout(self.settings.op_timeout, fut)
            .await
            .unwrap_or(Err(CacheError::Timeout));

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(op, key, error = %e, "Cache operation failed");
                None
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.live_backend()?;
        self.bounded("get", key, backend.get(key)).await.flatten()
    }

    /// Writes `value` for `ttl`, rounded down to whole seconds.
    ///
    /// TTLs under one second are not written at all.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) {
        let Some(backend) = self.live_backend() else {
            return;
        };

        let ttl_seconds = ttl.as_secs();
        if ttl_seconds == 0 {
            debug!(key, "Skipping cache write with sub-second TTL");
            return;
        }

        self.bounded("set", key, backend.set_ex(key, value, ttl_seconds))
            .await;
    }

    pub async fn delete(&self, key: &str) {
        if let Some(backend) = self.live_backend() {
            self.bounded("delete", key, backend.delete(key)).await;
        }
    }

    /// Reads several keys in one round trip. All misses when unavailable.
    pub async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        let Some(backend) = self.live_backend() else {
            return vec![None; keys.len()];
        };

        match self.bounded("get_many", "*", backend.get_many(keys)).await {
            Some(values) if values.len() == keys.len() => values,
            _ => vec![None; keys.len()],
        }
    }

    pub async fn get_url(&self, short_code: &str) -> Option<String> {
        let value = self.get(&format!("{URL_PREFIX}{short_code}")).await;
        record_lookup("url", value.is_some());
        value
    }

    /// Caches a URL projection.
    ///
    /// The TTL is the configured URL TTL, shortened to `lifetime` when the
    /// record expires sooner.
    pub async fn set_url(&self, short_code: &str, long_url: &str, lifetime: Option<Duration>) {
        let ttl = match lifetime {
            Some(remaining) => remaining.min(self.settings.url_ttl),
            None => self.settings.url_ttl,
        };

        self.set_with_ttl(&format!("{URL_PREFIX}{short_code}"), long_url, ttl)
            .await;
    }

    pub async fn delete_url(&self, short_code: &str) {
        self.delete(&format!("{URL_PREFIX}{short_code}")).await;
    }

    pub async fn get_dedup(&self, url_hash: &str) -> Option<String> {
        let value = self.get(&format!("{DEDUP_PREFIX}{url_hash}")).await;
        record_lookup("dedup", value.is_some());
        value
    }

    pub async fn set_dedup(&self, url_hash: &str, short_code: &str) {
        self.set_with_ttl(
            &format!("{DEDUP_PREFIX}{url_hash}"),
            short_code,
            self.settings.dedup_ttl,
        )
        .await;
    }

    /// Looks up several short codes in one pipelined call.
    pub async fn get_urls_bulk(&self, short_codes: &[String]) -> HashMap<String, Option<String>> {
        let keys: Vec<String> = short_codes
            .iter()
            .map(|code| format!("{URL_PREFIX}{code}"))
            .collect();

        let values = self.get_many(&keys).await;

        short_codes.iter().cloned().zip(values).collect()
    }
}

fn record_lookup(namespace: &'static str, hit: bool) {
    if hit {
        metrics::counter!("cache_hits_total", "namespace" => namespace).increment(1);
    } else {
        metrics::counter!("cache_misses_total", "namespace" => namespace).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::service::MockCacheService;
    use async_trait::async_trait;

    fn available(mock: MockCacheService) -> VolatileCache {
        VolatileCache::new(
            CacheHandle::Available(Arc::new(mock)),
            CacheSettings::default(),
        )
    }

    struct StallingCache;

    #[async_trait]
    impl CacheService for StallingCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some("late".to_string()))
        }
        async fn set_ex(&self, _key: &str, _value: &str, _ttl: u64) -> CacheResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Ok(())
        }
        async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<Option<String>>> {
            Ok(vec![None; keys.len()])
        }
        async fn window_record(
            &self,
            _key: &str,
            _member: &str,
            _score_ms: i64,
            _window_start_ms: i64,
            _ttl_seconds: u64,
        ) -> CacheResult<u64> {
            Ok(1)
        }
        async fn window_remove(&self, _key: &str, _member: &str) -> CacheResult<()> {
            Ok(())
        }
        async fn ping(&self) -> CacheResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_unavailable_cache_misses_and_ignores_writes() {
        let cache = VolatileCache::unavailable(CacheSettings::default());

        cache.set_url("abc", "https://example.com", None).await;

        assert!(!cache.is_available());
        assert_eq!(cache.get_url("abc").await, None);
        assert!(!cache.probe().await);
    }

    #[tokio::test]
    async fn test_backend_errors_degrade_to_miss() {
        let mut mock = MockCacheService::new();
        mock.expect_get()
            .returning(|_| Err(CacheError::OperationError("broken pipe".to_string())));
        mock.expect_set_ex()
            .returning(|_, _, _| Err(CacheError::OperationError("broken pipe".to_string())));

        let cache = available(mock);

        assert_eq!(cache.get_url("abc").await, None);
        cache.set_dedup("hash", "abc").await;
        assert!(cache.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let cache = VolatileCache::new(
            CacheHandle::Available(Arc::new(StallingCache)),
            CacheSettings::default(),
        );

        assert_eq!(cache.get_url("abc").await, None);
        cache.set_url("abc", "https://example.com", None).await;
    }

    #[tokio::test]
    async fn test_set_url_uses_configured_ttl_without_expiry() {
        let mut mock = MockCacheService::new();
        mock.expect_set_ex()
            .withf(|key, value, ttl| key == "url:abc" && value == "https://example.com" && *ttl == 3600)
            .times(1)
            .returning(|_, _, _| Ok(()));

        available(mock)
            .set_url("abc", "https://example.com", None)
            .await;
    }

    #[tokio::test]
    async fn test_set_url_caps_ttl_at_remaining_lifetime() {
        let mut mock = MockCacheService::new();
        mock.expect_set_ex()
            .withf(|_, _, ttl| *ttl == 120)
            .times(1)
            .returning(|_, _, _| Ok(()));

        available(mock)
            .set_url("abc", "https://example.com", Some(Duration::from_millis(120_500)))
            .await;
    }

    #[tokio::test]
    async fn test_set_url_skips_nearly_expired_record() {
        let mut mock = MockCacheService::new();
        mock.expect_set_ex().times(0);

        available(mock)
            .set_url("abc", "https://example.com", Some(Duration::from_millis(400)))
            .await;
    }

    #[tokio::test]
    async fn test_set_dedup_uses_dedup_namespace_and_ttl() {
        let mut mock = MockCacheService::new();
        mock.expect_set_ex()
            .withf(|key, value, ttl| key == "dedup:hash" && value == "abc" && *ttl == 86_400)
            .times(1)
            .returning(|_, _, _| Ok(()));

        available(mock).set_dedup("hash", "abc").await;
    }

    #[tokio::test]
    async fn test_failed_probe_short_circuits_operations() {
        let mut mock = MockCacheService::new();
        mock.expect_ping()
            .returning(|| Err(CacheError::ConnectionError("refused".to_string())));
        mock.expect_get().times(0);

        let cache = available(mock);
        assert!(cache.is_available());

        assert!(!cache.probe().await);
        assert!(!cache.is_available());
        assert_eq!(cache.get_url("abc").await, None);
    }

    #[tokio::test]
    async fn test_probe_restores_availability() {
        let mut mock = MockCacheService::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_ping()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(CacheError::Timeout));
        mock.expect_ping()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let cache = available(mock);

        assert!(!cache.probe().await);
        assert!(cache.probe().await);
        assert!(cache.is_available());
    }

    #[tokio::test]
    async fn test_get_urls_bulk_pairs_codes_with_values() {
        let mut mock = MockCacheService::new();
        mock.expect_get_many()
            .withf(|keys| keys.len() == 2 && keys[0] == "url:a" && keys[1] == "url:b")
            .returning(|_| Ok(vec![Some("https://a.example".to_string()), None]));

        let result = available(mock)
            .get_urls_bulk(&["a".to_string(), "b".to_string()])
            .await;

        assert_eq!(result["a"].as_deref(), Some("https://a.example"));
        assert_eq!(result["b"], None);
    }

    #[tokio::test]
    async fn test_get_urls_bulk_when_unavailable() {
        let cache = VolatileCache::unavailable(CacheSettings::default());

        let result = cache.get_urls_bulk(&["a".to_string()]).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result["a"], None);
    }
}
