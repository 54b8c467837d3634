//! Double-submit cookie CSRF guard.
//!
//! The token lives in a script-readable cookie and must be echoed in the
//! `x-csrf-token` header on every mutating request. A cross-origin page cannot
//! read the cookie, so it cannot forge a matching header. There is no
//! server-side registry: equality of the two copies is the whole check.

use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;
use utoipa::ToSchema;

use super::{cookies::CookieStore, error::AuthError, state::AuthState, utils::client_identifier};

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";
const CSRF_TOKEN_BYTES: usize = 32;

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// 256 random bits from the OS RNG, hex-encoded.
#[must_use]
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether a cookie value has the shape of a token we minted.
#[must_use]
pub fn is_well_formed(token: &str) -> bool {
    token.len() == CSRF_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[must_use]
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Constant-time equality; inputs of different length never match.
#[must_use]
pub fn tokens_match(cookie: &str, header: &str) -> bool {
    cookie.as_bytes().ct_eq(header.as_bytes()).into()
}

/// Validate the double-submit pair for one request. Fails closed.
///
/// # Errors
/// `AuthError::CsrfMissing` when either copy is absent, `AuthError::CsrfMismatch`
/// when they differ.
pub fn validate_csrf(method: &Method, headers: &HeaderMap) -> Result<(), AuthError> {
    if is_safe_method(method) {
        return Ok(());
    }

    let cookie = CookieStore::csrf(headers);
    let header = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (cookie, header) {
        (Some(cookie), Some(header)) => {
            if tokens_match(&cookie, header) {
                Ok(())
            } else {
                Err(AuthError::CsrfMismatch)
            }
        }
        _ => Err(AuthError::CsrfMissing),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/csrf",
    responses(
        (status = 200, description = "CSRF token issued or reused", body = CsrfTokenResponse)
    ),
    tag = "auth"
)]
pub async fn csrf_token(
    auth_state: Extension<Arc<AuthState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    // Reuse a valid cookie so concurrent tabs keep working with the same token.
    let existing = jar
        .get(super::cookies::CSRF_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| is_well_formed(token));

    let (jar, token) = match existing {
        Some(token) => (jar, token),
        None => {
            let token = generate_csrf_token();
            let jar = auth_state.cookies().set_csrf(jar, token.clone());
            (jar, token)
        }
    };

    (jar, Json(CsrfTokenResponse { csrf_token: token }))
}

/// Middleware for endpoints that need CSRF protection but no session (login).
pub async fn require_csrf(request: Request, next: Next) -> Response {
    if let Err(err) = validate_csrf(request.method(), request.headers()) {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            client = %client_identifier(request.headers()),
            "CSRF validation failed: {err}"
        );
        return err.into_response();
    }
    next.run(request).await
}
