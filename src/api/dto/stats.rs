//! DTOs for link statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::UrlStats;

/// Click statistics for one short code.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub long_url: String,
    pub clicks: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<UrlStats> for StatsResponse {
    fn from(stats: UrlStats) -> Self {
        Self {
            short_code: stats.short_code,
            long_url: stats.long_url,
            clicks: stats.clicks,
            expires_at: stats.expires_at,
        }
    }
}
