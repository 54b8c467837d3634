//! Session and CSRF cookies.
//!
//! Both cookies share `Path=/`, `SameSite=Lax` and `Secure` in production. The
//! session cookie is `HttpOnly`; the CSRF cookie must stay readable by page
//! script so it can be echoed in the `x-csrf-token` header.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

pub const SESSION_COOKIE_NAME: &str = "auth_token";
pub const CSRF_COOKIE_NAME: &str = "csrf_token";
pub const SESSION_COOKIE_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;
pub const CSRF_COOKIE_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone, Copy, Debug)]
pub struct CookieStore {
    secure: bool,
}

impl CookieStore {
    #[must_use]
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age_seconds: i64,
    ) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age_seconds))
            .build()
    }

    /// Attach the session token cookie.
    #[must_use]
    pub fn set_session(&self, jar: CookieJar, token: String) -> CookieJar {
        jar.add(self.build(
            SESSION_COOKIE_NAME,
            token,
            true,
            SESSION_COOKIE_MAX_AGE_SECONDS,
        ))
    }

    /// Overwrite the session cookie with an empty value that expires at once.
    #[must_use]
    pub fn clear_session(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.build(SESSION_COOKIE_NAME, String::new(), true, 0))
    }

    /// Attach the CSRF cookie; not `HttpOnly`.
    #[must_use]
    pub fn set_csrf(&self, jar: CookieJar, token: String) -> CookieJar {
        jar.add(self.build(
            CSRF_COOKIE_NAME,
            token,
            false,
            CSRF_COOKIE_MAX_AGE_SECONDS,
        ))
    }

    #[must_use]
    pub fn session(headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, SESSION_COOKIE_NAME)
    }

    #[must_use]
    pub fn csrf(headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, CSRF_COOKIE_NAME)
    }
}

/// Read a non-empty cookie value by name.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    fn delta(jar: &CookieJar, name: &str) -> Option<Cookie<'static>> {
        jar.get(name).cloned()
    }

    #[test]
    fn session_cookie_has_security_attributes() {
        let jar = CookieStore::new(true).set_session(CookieJar::new(), "token".to_string());
        let cookie = delta(&jar, SESSION_COOKIE_NAME);
        assert!(cookie.is_some());
        if let Some(cookie) = cookie {
            assert_eq!(cookie.value(), "token");
            assert_eq!(cookie.http_only(), Some(true));
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(
                cookie.max_age(),
                Some(Duration::seconds(SESSION_COOKIE_MAX_AGE_SECONDS))
            );
        }
    }

    #[test]
    fn csrf_cookie_is_script_readable() {
        let jar = CookieStore::new(false).set_csrf(CookieJar::new(), "abc".to_string());
        let cookie = delta(&jar, CSRF_COOKIE_NAME);
        assert!(cookie.is_some());
        if let Some(cookie) = cookie {
            assert_eq!(cookie.http_only(), Some(false));
            assert_eq!(cookie.secure(), Some(false));
            assert_eq!(
                cookie.max_age(),
                Some(Duration::seconds(CSRF_COOKIE_MAX_AGE_SECONDS))
            );
        }
    }

    #[test]
    fn clear_session_sets_empty_value_and_zero_max_age() {
        let jar = CookieStore::new(true).clear_session(CookieJar::new());
        let cookie = delta(&jar, SESSION_COOKIE_NAME);
        assert!(cookie.is_some());
        if let Some(cookie) = cookie {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
            assert_eq!(cookie.http_only(), Some(true));
        }
    }

    #[test]
    fn reads_cookies_from_request_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; csrf_token=ff00"),
        );
        assert_eq!(
            CookieStore::session(&headers),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(CookieStore::csrf(&headers), Some("ff00".to_string()));
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("auth_token="));
        assert_eq!(CookieStore::session(&headers), None);
        assert_eq!(CookieStore::csrf(&HeaderMap::new()), None);
    }
}
