//! Page-level gate for the admin UI.
//!
//! Only checks that a session cookie is present. The cookie is not verified
//! here; an expired cookie gets through and the page's own API calls fail
//! with 401 in `require_auth`.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;
use url::form_urlencoded;

use super::cookies::CookieStore;

pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";

/// Whether `path` is an admin page that requires a session cookie.
#[must_use]
pub fn is_guarded_path(path: &str) -> bool {
    let under_admin = path == ADMIN_PREFIX
        || path
            .strip_prefix(ADMIN_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'));
    let is_login = path.trim_end_matches('/') == LOGIN_PATH;
    under_admin && !is_login
}

/// Login URL that returns the user to `target` afterwards.
#[must_use]
pub fn login_redirect(target: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", target)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

pub async fn route_guard(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_guarded_path(path) || CookieStore::session(request.headers()).is_some() {
        return next.run(request).await;
    }

    let target = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.to_string(), |pq| pq.as_str().to_string());
    debug!(path, "no session cookie, redirecting to login");
    Redirect::temporary(&login_redirect(&target)).into_response()
}
