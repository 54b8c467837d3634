//! Login, logout and current-session endpoints.
//!
//! Flow Overview (login):
//! 1) `require_csrf` runs as a route layer before the handler.
//! 2) The client identifier is counted against the login rate limit; every
//!    response from here on carries `X-RateLimit-*` headers.
//! 3) Payload validation (400), then credential verification (401 with one
//!    generic message for unknown users and wrong passwords).
//! 4) On success a session token is issued and set as the `auth_token` cookie.

use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{
    error::{AuthError, ErrorBody, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET},
    rate_limit::RateLimitDecision,
    state::AuthState,
    token::{Identity, TokenLifetime},
    types::{LoginRequest, LoginResponse, MeResponse},
    utils::{client_identifier, normalize_username, unix_now, valid_username},
};

pub(crate) const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";
pub(crate) const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

fn rate_limit_headers(decision: &RateLimitDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at));
    headers
}

pub(crate) fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(message, VALIDATION_ERROR_CODE)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    params(
        ("x-csrf-token" = String, Header, description = "Double-submit CSRF token")
    ),
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid username or password", body = ErrorBody),
        (status = 403, description = "CSRF validation failed", body = ErrorBody),
        (status = 429, description = "Too many attempts", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip_all, fields(client = tracing::field::Empty))]
pub async fn login(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    jar: CookieJar,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let client = client_identifier(&headers);
    tracing::Span::current().record("client", client.as_str());

    let config = auth_state.config();
    let decision = auth_state.rate_limiter().check(
        &client,
        config.login_limit(),
        config.login_window(),
    );
    if !decision.allowed {
        let retry_after = decision.retry_after(unix_now());
        warn!(retry_after, "login rate limit exceeded");
        return AuthError::RateLimited {
            limit: decision.limit,
            reset_at: decision.reset_at,
            retry_after,
        }
        .into_response();
    }
    let limit_headers = rate_limit_headers(&decision);

    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (limit_headers, bad_request("Missing payload")).into_response(),
    };

    let username = normalize_username(&request.username);
    if username.is_empty() || request.password.is_empty() {
        return (
            limit_headers,
            bad_request("Username and password are required"),
        )
            .into_response();
    }

    let identity = if valid_username(&username) {
        match auth_state
            .users()
            .verify_credentials(&username, &request.password)
            .await
        {
            Ok(identity) => identity,
            Err(err) => {
                error!("Credential lookup failed: {err:#}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    limit_headers,
                    "Login failed".to_string(),
                )
                    .into_response();
            }
        }
    } else {
        None
    };

    let Some(identity) = identity else {
        warn!(username = %username, "invalid login attempt");
        return (limit_headers, AuthError::InvalidCredentials).into_response();
    };

    let lifetime = if request.remember_me.unwrap_or(false) {
        TokenLifetime::Extended
    } else {
        TokenLifetime::Standard
    };
    let token = match auth_state.tokens().issue(&identity, lifetime) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                limit_headers,
                "Login failed".to_string(),
            )
                .into_response();
        }
    };

    info!(username = %identity.username, ?lifetime, "login succeeded");
    let jar = auth_state.cookies().set_session(jar, token);
    (
        StatusCode::OK,
        limit_headers,
        jar,
        Json(LoginResponse {
            user: identity,
            message: LOGIN_SUCCESS_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>, jar: CookieJar) -> impl IntoResponse {
    // Always clear the cookie, whether or not a session was present.
    let jar = auth_state.cookies().clear_session(jar);
    (StatusCode::NO_CONTENT, jar)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session identity", body = MeResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn me(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(MeResponse { user: identity })
}
