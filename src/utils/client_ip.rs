//! Client identity extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Identity used when neither headers nor the socket reveal the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Determines which client a request belongs to.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`. Otherwise proxy headers are ignored, since any client
/// could forge them, and the socket peer address is used.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(client_identity(&headers, None, true), "203.0.113.7");
/// ```
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy
        && let Some(ip) = forwarded_ip(headers)
    {
        return ip;
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_value(X_FORWARDED_FOR)
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first.to_string());
    }

    header_value(X_REAL_IP).map(str::to_string)
}
