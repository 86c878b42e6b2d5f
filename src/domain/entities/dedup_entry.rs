//! Deduplication index entry.

use chrono::{DateTime, Utc};

/// Maps the digest of a normalized long URL to the first code minted for it.
///
/// At most one entry exists per `url_hash`; later writers for the same hash
/// leave the original entry untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupEntry {
    pub url_hash: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
}

impl DedupEntry {
    pub fn new(url_hash: String, short_code: String, created_at: DateTime<Utc>) -> Self {
        Self {
            url_hash,
            short_code,
            created_at,
        }
    }
}
