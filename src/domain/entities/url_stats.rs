//! Read model for the stats endpoint.

use chrono::{DateTime, Utc};

/// Click count and lifetime of a single short code, read from the durable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlStats {
    pub short_code: String,
    pub long_url: String,
    pub clicks: i64,
    pub expires_at: Option<DateTime<Utc>>,
}
