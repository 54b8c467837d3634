//! Authenticated identity extraction for protected handlers.
//!
//! Flow Overview:
//! 1) Validate the CSRF pair (mutating methods only). Failure is a 403 and
//!    nothing else is inspected.
//! 2) Walk `TOKEN_SOURCES` in order; the first source that yields a token wins.
//! 3) Verify the token. Any failure is a 401.
//! 4) Insert the verified `Identity` into request extensions so handlers can
//!    take `Extension<Identity>`.
//!
//! Handlers never check auth themselves; routes opt in with `protected(...)`.

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    cookies::CookieStore,
    csrf::validate_csrf,
    error::AuthError,
    state::AuthState,
    token::{Identity, TokenError},
    utils::client_identifier,
};

/// Where a session token may be carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// The `HttpOnly` `auth_token` cookie.
    SessionCookie,
    /// `Authorization: Bearer <token>` for non-browser clients.
    BearerHeader,
}

/// Extraction order; the cookie takes precedence over the header.
pub const TOKEN_SOURCES: [TokenSource; 2] = [TokenSource::SessionCookie, TokenSource::BearerHeader];

impl TokenSource {
    #[must_use]
    pub fn extract(self, headers: &HeaderMap) -> Option<String> {
        match self {
            Self::SessionCookie => CookieStore::session(headers),
            Self::BearerHeader => bearer_token(headers),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// First token found across `TOKEN_SOURCES`.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    TOKEN_SOURCES
        .iter()
        .find_map(|source| source.extract(headers))
}

/// Resolve request headers into a verified identity. CSRF is not checked here.
///
/// # Errors
/// `AuthError::MissingToken` when no source carries a token,
/// `AuthError::InvalidToken` when verification fails.
pub fn authenticate(auth_state: &AuthState, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = extract_session_token(headers).ok_or(AuthError::MissingToken)?;
    match auth_state.tokens().verify(&token) {
        Ok(claims) => Ok(claims.identity()),
        Err(TokenError::Expired) => {
            debug!("session token expired");
            Err(AuthError::InvalidToken)
        }
        Err(err) => {
            debug!("session token rejected: {err}");
            Err(AuthError::InvalidToken)
        }
    }
}

/// Middleware gating a protected handler: CSRF first, then the session token.
pub async fn require_auth(
    auth_state: Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = validate_csrf(request.method(), request.headers())
        .and_then(|()| authenticate(&auth_state, request.headers()));

    match result {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                client = %client_identifier(request.headers()),
                code = err.code(),
                "request rejected: {err}"
            );
            err.into_response()
        }
    }
}

/// Wrap a method router so every handler in it requires CSRF + session.
pub fn protected<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(middleware::from_fn(require_auth))
}
