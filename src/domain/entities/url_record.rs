//! URL record entity representing a short code → long URL mapping.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Canonical mapping stored in the durable store.
///
/// Records are never mutated after creation. Expiry is detected lazily on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the record never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
}

impl UrlRecord {
    /// Creates a record expiring `ttl_days` after `created_at` (`None` = never).
    ///
    /// An expiry beyond the representable date range saturates at
    /// [`DateTime::<Utc>::MAX_UTC`].
    pub fn new(
        short_code: String,
        long_url: String,
        created_at: DateTime<Utc>,
        ttl_days: Option<u32>,
        owner_id: Option<String>,
    ) -> Self {
        let expires_at = ttl_days.map(|days| {
            chrono::Duration::try_days(i64::from(days))
                .and_then(|ttl| created_at.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });

        Self {
            short_code,
            long_url,
            created_at,
            expires_at,
            owner_id,
        }
    }

    /// Returns true if the record has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Time left before expiry, or `None` for records that never expire.
    ///
    /// Already-expired records report `Some(Duration::ZERO)`.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|e| (e - now).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ttl_days: Option<u32>) -> UrlRecord {
        UrlRecord::new(
            "Ab3xQ9kL".to_string(),
            "https://example.com/a".to_string(),
            Utc::now(),
            ttl_days,
            None,
        )
    }

    #[test]
    fn test_record_without_ttl_never_expires() {
        let rec = record(None);

        assert!(rec.expires_at.is_none());
        assert!(!rec.is_expired_at(Utc::now()));
        assert!(rec.remaining_lifetime(Utc::now()).is_none());
    }

    #[test]
    fn test_record_expiry_from_ttl_days() {
        let rec = record(Some(30));

        let expires_at = rec.expires_at.unwrap();
        assert_eq!(expires_at - rec.created_at, chrono::Duration::days(30));
        assert!(!rec.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let rec = record(Some(0));

        assert!(rec.is_expired_at(Utc::now()));
        assert_eq!(rec.remaining_lifetime(Utc::now()), Some(Duration::ZERO));
    }

    #[test]
    fn test_expiry_past_date_range_saturates() {
        let rec = record(Some(u32::MAX));

        assert_eq!(rec.expires_at, Some(DateTime::<Utc>::MAX_UTC));
        assert!(!rec.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_remaining_lifetime_counts_down() {
        let rec = record(Some(1));
        let later = rec.created_at + chrono::Duration::hours(23);

        let left = rec.remaining_lifetime(later).unwrap();
        assert_eq!(left, Duration::from_secs(3600));
    }
}
