//! Cache backend trait and error types.

use async_trait::async_trait;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),

    #[error("Cache operation timed out")]
    Timeout,
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Raw key-value backend behind [`crate::infrastructure::cache::VolatileCache`].
///
/// Implementations report failures honestly; swallowing them and degrading to
/// a miss is the job of `VolatileCache`, not of the backend.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Reads a string value. `Ok(None)` on miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Writes a value that expires after `ttl_seconds` (must be at least 1).
    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Reads several keys in one round trip, preserving order.
    async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<Option<String>>>;

    /// Records one hit in a sliding-window sorted set.
    ///
    /// In a single round trip: drops members scored at or below
    /// `window_start_ms`, adds `member` scored `score_ms`, refreshes the key
    /// expiry to `ttl_seconds`, and returns the member count after insertion.
    async fn window_record(
        &self,
        key: &str,
        member: &str,
        score_ms: i64,
        window_start_ms: i64,
        ttl_seconds: u64,
    ) -> CacheResult<u64>;

    /// Removes a single member from a sliding-window sorted set.
    async fn window_remove(&self, key: &str, member: &str) -> CacheResult<()>;

    /// Checks that the backend answers.
    async fn ping(&self) -> CacheResult<()>;
}
