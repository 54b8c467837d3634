//! Small helpers shared by the auth handlers.

use axum::http::HeaderMap;
use regex::Regex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rate-limit bucket shared by every request that carries no proxy header.
pub(crate) const UNKNOWN_CLIENT: &str = "unknown";

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Normalize a username for lookups.
pub(crate) fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Basic username format check on already-normalized input.
pub(crate) fn valid_username(username_normalized: &str) -> bool {
    Regex::new(r"^[a-z0-9._-]{3,64}$").is_ok_and(|regex| regex.is_match(username_normalized))
}

/// Extract a client IP for rate limiting from common proxy headers.
///
/// Forwarded headers are trusted as-is; without a trusted proxy in front of
/// the service they can be spoofed.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Rate-limit key for a request, falling back to one shared bucket.
pub(crate) fn client_identifier(headers: &HeaderMap) -> String {
    extract_client_ip(headers).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn normalize_username_trims_and_lowercases() {
        assert_eq!(normalize_username("  Admin "), "admin");
    }

    #[test]
    fn valid_username_rejects_bad_input() {
        assert!(valid_username("admin"));
        assert!(valid_username("site.editor-2"));
        assert!(!valid_username("ab"));
        assert!(!valid_username("with space"));
        assert!(!valid_username(""));
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn client_identifier_defaults_to_shared_bucket() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
        assert_eq!(client_identifier(&headers), UNKNOWN_CLIENT);
    }

    #[test]
    fn unix_now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800);
    }
}
