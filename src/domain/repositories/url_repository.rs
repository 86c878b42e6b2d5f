//! Repository trait for the durable URL store.

use crate::domain::entities::{DedupEntry, UrlRecord};
use crate::error::AppError;
use async_trait::async_trait;

/// Durable store holding URL records, the dedup index and click counters.
///
/// All implementations must use parameterized queries. Failures surface as
/// [`AppError::BackendUnavailable`] and are never swallowed.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Inserts a record unless its short code is already taken.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the record was written
    /// - `Ok(false)` if another record already owns the short code
    async fn insert_url(&self, record: &UrlRecord) -> Result<bool, AppError>;

    /// Inserts a dedup entry. An existing entry for the same hash is kept.
    async fn insert_dedup(&self, entry: &DedupEntry) -> Result<(), AppError>;

    /// Finds a record by its short code.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Finds the short code first minted for a URL digest.
    async fn find_dedup(&self, url_hash: &str) -> Result<Option<String>, AppError>;

    /// Increments the click counter of a short code by exactly one.
    ///
    /// The counter is created at zero on first increment.
    async fn increment_clicks(&self, short_code: &str) -> Result<(), AppError>;

    /// Returns the click count of a short code (zero if never clicked).
    async fn get_clicks(&self, short_code: &str) -> Result<i64, AppError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}
