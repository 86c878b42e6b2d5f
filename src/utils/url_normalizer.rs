//! URL normalization used for deduplication.
//!
//! Two inputs that differ only in host case, default port, fragment or stray
//! control characters normalize to the same string and therefore the same
//! dedup digest.

use url::Url;

/// Maximum accepted URL length, measured on the sanitized input.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL too long (max {MAX_URL_LENGTH} characters)")]
    TooLong,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Removes NUL and other control characters (except tab/newline/CR) and trims.
pub fn sanitize_url(input: &str) -> String {
    input
        .chars()
        .filter(|&c| c as u32 >= 32 || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalizes a URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Sanitization**: control characters stripped, whitespace trimmed
/// 2. **Length**: at most 2048 characters
/// 3. **Protocol**: only HTTP and HTTPS
/// 4. **Hostname**: lowercased
/// 5. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 6. **Fragments**: removed
/// 7. **Path and query**: preserved as-is
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs,
/// [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes and
/// [`UrlNormalizationError::TooLong`] for oversized input.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let sanitized = sanitize_url(input);
    if sanitized.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let mut url =
        Url::parse(&sanitized).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    if let Some(host) = url.host_str().map(str::to_ascii_lowercase) {
        url.set_host(Some(&host)).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to set normalized host".to_string())
        })?;
    }

    url.set_fragment(None);

    if matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        url.set_port(None).map_err(|_| {
            UrlNormalizationError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    let normalized = url.to_string();
    if normalized.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_root_path() {
        assert_eq!(
            normalize_url("https://example.com").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_normalize_lowercases_host_only() {
        assert_eq!(
            normalize_url("https://EXAMPLE.COM/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_normalize_removes_default_ports() {
        assert_eq!(
            normalize_url("http://example.com:80/a").unwrap(),
            "http://example.com/a"
        );
        assert_eq!(
            normalize_url("https://example.com:443/a").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_normalize_keeps_custom_port() {
        assert_eq!(
            normalize_url("https://example.com:8443/a").unwrap(),
            "https://example.com:8443/a"
        );
    }

    #[test]
    fn test_normalize_removes_fragment_keeps_query() {
        assert_eq!(
            normalize_url("https://example.com/page?x=1&y=2#section").unwrap(),
            "https://example.com/page?x=1&y=2"
        );
    }

    #[test]
    fn test_equivalent_inputs_normalize_identically() {
        let a = normalize_url("HTTPS://Example.com:443/a#frag").unwrap();
        let b = normalize_url("  https://example.com/a\u{0000}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(
            sanitize_url("\u{0007}https://example.com/\u{0000} "),
            "https://example.com/"
        );
    }

    #[test]
    fn test_normalize_rejects_other_schemes() {
        for input in [
            "ftp://example.com/file.txt",
            "javascript:alert('xss')",
            "data:text/plain,Hello",
            "mailto:test@example.com",
            "file:///etc/passwd",
        ] {
            assert!(
                matches!(
                    normalize_url(input),
                    Err(UrlNormalizationError::UnsupportedProtocol)
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_invalid_format() {
        assert!(matches!(
            normalize_url("not a valid url"),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize_url(""),
            Err(UrlNormalizationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_oversized_url() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            normalize_url(&url),
            Err(UrlNormalizationError::TooLong)
        ));
    }

    #[test]
    fn test_normalize_accepts_url_at_limit() {
        let prefix = "https://example.com/";
        let url = format!("{prefix}{}", "a".repeat(MAX_URL_LENGTH - prefix.len()));
        assert_eq!(normalize_url(&url).unwrap().len(), MAX_URL_LENGTH);
    }
}
