//! Typed rejections for the auth perimeter.
//!
//! Every failure is rendered as JSON `{ "error": ..., "code": ... }` with a
//! stable code so clients can branch without parsing messages.

use axum::{
    http::{
        header::{HeaderName, RETRY_AFTER},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

pub(crate) const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub(crate) const X_RATELIMIT_REMAINING: HeaderName =
    HeaderName::from_static("x-ratelimit-remaining");
pub(crate) const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("CSRF token missing")]
    CsrfMissing,
    #[error("CSRF token mismatch")]
    CsrfMismatch,
    #[error("Authentication required")]
    MissingToken,
    #[error("Invalid or expired session")]
    InvalidToken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Too many login attempts, try again later")]
    RateLimited {
        limit: u32,
        reset_at: u64,
        retry_after: u64,
    },
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CsrfMissing | Self::CsrfMismatch => StatusCode::FORBIDDEN,
            Self::MissingToken | Self::InvalidToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Stable machine-readable code. Both CSRF variants share one code so the
    /// response does not reveal which half of the pair was wrong.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CsrfMissing | Self::CsrfMismatch => "CSRF_TOKEN_INVALID",
            Self::MissingToken | Self::InvalidToken => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::RateLimited { .. } => "RATE_LIMITED",
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            reset_time: None,
            retry_after: None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        let (reset_time, retry_after) = match &self {
            Self::RateLimited {
                limit,
                reset_at,
                retry_after,
            } => {
                headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after));
                headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(*limit));
                headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0_u32));
                headers.insert(X_RATELIMIT_RESET, HeaderValue::from(*reset_at));
                (Some(*reset_at), Some(*retry_after))
            }
            _ => (None, None),
        };

        let body = ErrorBody {
            reset_time,
            retry_after,
            ..ErrorBody::new(self.to_string(), self.code())
        };

        (self.status(), headers, Json(body)).into_response()
    }
}
