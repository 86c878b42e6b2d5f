//! Short code generation and validation utilities.
//!
//! Generated codes combine a URL-derived prefix with fresh randomness: the
//! prefix groups codes minted for the same URL, the random suffix makes codes
//! unpredictable from the URL alone.

use crate::error::AppError;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Length of every generated short code.
pub const CODE_LENGTH: usize = 8;

/// Bytes of the URL digest used as the code prefix.
const HASH_PREFIX_BYTES: usize = 4;

/// Random bytes appended to the digest prefix.
const RANDOM_SUFFIX_BYTES: usize = 2;

/// Random bytes used by the fallback generator.
const FALLBACK_BYTES: usize = 6;

/// Longest short code accepted anywhere in the system.
pub const MAX_CODE_LENGTH: usize = 30;

/// Shortest custom alias accepted.
pub const MIN_ALIAS_LENGTH: usize = 3;

/// Maximum stored owner identifier length.
pub const MAX_OWNER_ID_LENGTH: usize = 100;

/// Reserved codes that cannot be used as custom aliases.
///
/// These collide with service routes or commonly probed paths.
const RESERVED_CODES: &[&str] = &[
    "health",
    "stats",
    "shorten",
    "api",
    "admin",
    "docs",
    "redoc",
    "openapi",
    "login",
    "logout",
    "register",
    "signup",
    "signin",
    "auth",
    "oauth",
    "user",
    "users",
    "account",
    "profile",
    "settings",
    "dashboard",
    "static",
    "assets",
    "images",
    "css",
    "js",
    "favicon",
    "robots",
    "root",
    "administrator",
    "system",
    "config",
    "env",
];

/// Generates the primary short code for a URL.
///
/// The first 4 bytes of the URL's SHA-256 digest are followed by 2 bytes from
/// the thread-local CSPRNG, and the 6 bytes are encoded as URL-safe base64,
/// producing exactly 8 characters.
///
/// # Examples
///
/// ```ignore
/// let a = generate_code("https://example.com/a");
/// let b = generate_code("https://example.com/a");
/// assert_eq!(a.len(), 8);
/// assert_eq!(&a[..5], &b[..5]); // shared digest prefix
/// ```
pub fn generate_code(long_url: &str) -> String {
    let digest = Sha256::digest(long_url.as_bytes());

    let mut buffer = [0u8; HASH_PREFIX_BYTES + RANDOM_SUFFIX_BYTES];
    buffer[..HASH_PREFIX_BYTES].copy_from_slice(&digest[..HASH_PREFIX_BYTES]);
    rand::rng().fill_bytes(&mut buffer[HASH_PREFIX_BYTES..]);

    encode(&buffer)
}

/// Generates a code from 6 fresh random bytes, ignoring the URL.
///
/// Used once when the primary code collides with another record.
pub fn generate_fallback_code() -> String {
    let mut buffer = [0u8; FALLBACK_BYTES];
    rand::rng().fill_bytes(&mut buffer);

    encode(&buffer)
}

fn encode(bytes: &[u8]) -> String {
    let mut code = URL_SAFE_NO_PAD.encode(bytes);
    code.truncate(CODE_LENGTH);
    code
}

/// Hex-encoded SHA-256 digest of a normalized URL, used as the dedup key.
pub fn url_hash(normalized_url: &str) -> String {
    hex::encode(Sha256::digest(normalized_url.as_bytes()))
}

/// Returns true if `code` could be a stored short code.
///
/// Checks only syntax: non-empty, at most 30 characters, ASCII letters,
/// digits, `-` and `_`.
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validates a user-provided custom alias.
///
/// # Rules
///
/// - Length: 3-30 characters
/// - Allowed characters: ASCII letters, digits, hyphens, underscores
/// - Must start with a letter or digit
/// - Cannot be a reserved word (case-insensitive)
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] if any validation rule is violated.
pub fn validate_custom_code(alias: &str) -> Result<(), AppError> {
    if alias.len() < MIN_ALIAS_LENGTH || alias.len() > MAX_CODE_LENGTH {
        return Err(AppError::invalid_input(
            "Custom alias must be 3-30 characters",
            json!({ "provided_length": alias.len() }),
        ));
    }

    if alias.contains("..") || alias.contains('/') || alias.contains('\\') || alias.contains('%')
    {
        return Err(AppError::invalid_input(
            "Invalid characters in alias",
            json!({ "alias": alias }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::invalid_input(
            "Custom alias can only contain letters, numbers, hyphens, and underscores",
            json!({ "alias": alias }),
        ));
    }

    if !alias.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(AppError::invalid_input(
            "Custom alias must start with a letter or number",
            json!({ "alias": alias }),
        ));
    }

    let lowered = alias.to_ascii_lowercase();
    if RESERVED_CODES.contains(&lowered.as_str()) {
        return Err(AppError::invalid_input(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}

/// Keeps only `[A-Za-z0-9_.-]` and truncates to 100 characters.
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_owner_id(owner_id: &str) -> Option<String> {
    let sanitized: String = owner_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(MAX_OWNER_ID_LENGTH)
        .collect();

    (!sanitized.is_empty()).then_some(sanitized)
}
