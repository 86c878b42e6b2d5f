//! Safety screening for URLs submitted for shortening.
//!
//! Runs before any I/O. A URL that fails here never reaches the service.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::url_normalizer::{MAX_URL_LENGTH, sanitize_url};

/// Schemes and pseudo-schemes that must not appear anywhere in a URL.
static BLOCKED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:|data:|vbscript:|file://").unwrap());

static IPV4_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap());

/// Free TLDs commonly used for abuse.
const BLOCKED_TLDS: &[&str] = &["tk", "ml", "ga", "cf", "gq"];

const BLOCKED_DOMAINS: &[&str] = &["malware.com", "phishing.com", "evil.com"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlSafetyError {
    #[error("Invalid URL format")]
    InvalidFormat,

    #[error("Invalid URL scheme: {0}. Only http/https allowed.")]
    UnsupportedScheme(String),

    #[error("URL contains blocked pattern")]
    BlockedPattern,

    #[error("URLs from .{0} domains are not allowed")]
    BlockedTld(String),

    #[error("This domain is blocked")]
    BlockedDomain,

    #[error("IP-based URLs are not allowed")]
    IpHost,

    #[error("URL too long (max {MAX_URL_LENGTH} characters)")]
    TooLong,
}

/// Sanitizes `input` and checks it against the blocklists.
///
/// Returns the sanitized URL on success so callers shorten exactly what was
/// screened.
///
/// # Errors
///
/// Returns the first [`UrlSafetyError`] rule the URL violates.
pub fn check_url_safety(input: &str) -> Result<String, UrlSafetyError> {
    let url = sanitize_url(input);

    let parsed = Url::parse(&url).map_err(|_| UrlSafetyError::InvalidFormat)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlSafetyError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if BLOCKED_PATTERN.is_match(&url) {
        return Err(UrlSafetyError::BlockedPattern);
    }

    let host = parsed
        .host_str()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if let Some((_, tld)) = host.rsplit_once('.')
        && BLOCKED_TLDS.contains(&tld)
    {
        return Err(UrlSafetyError::BlockedTld(tld.to_string()));
    }

    if BLOCKED_DOMAINS.contains(&host.as_str()) {
        return Err(UrlSafetyError::BlockedDomain);
    }

    if IPV4_HOST.is_match(&host) {
        return Err(UrlSafetyError::IpHost);
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(UrlSafetyError::TooLong);
    }

    Ok(url)
}
