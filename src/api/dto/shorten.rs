//! DTOs for the shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten (HTTP/HTTPS, at most 2048 characters).
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 2048))]
    pub url: String,

    /// Optional custom short code. Character rules are checked separately.
    #[validate(length(min = 3, max = 30))]
    pub custom_alias: Option<String>,

    /// Optional owner identifier, sanitized before storage.
    #[validate(length(max = 100))]
    pub user_id: Option<String>,

    /// Lifetime in days. The configured default applies when absent.
    #[validate(range(min = 1, max = 3650))]
    pub ttl_days: Option<u32>,
}

/// Created (or deduplicated) short URL.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
}
