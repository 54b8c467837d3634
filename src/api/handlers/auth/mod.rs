//! Authentication perimeter for the admin surface.
//!
//! Pieces, leaves first:
//!
//! - `token`: HS256 session tokens carrying `{userId, username, role}`.
//! - `cookies`: the `HttpOnly` `auth_token` cookie and the script-readable
//!   `csrf_token` cookie.
//! - `csrf`: double-submit validation and the token issuance endpoint.
//! - `rate_limit`: fixed-window counter behind a pluggable store, swept by a
//!   background lifecycle object.
//! - `principal`: `require_auth`, the single enforcement point for protected
//!   handlers (CSRF first, then the session token).
//! - `route_guard`: redirects admin page navigations without a session cookie.
//!
//! ## Login Rate Limiting
//!
//! `POST /api/auth/login` allows 5 attempts per client per 15 minutes. The
//! client is the first `x-forwarded-for` hop, then `x-real-ip`; requests with
//! neither share the `"unknown"` bucket.
//!
//! ## Sessions
//!
//! Tokens are never stored server-side. Logout clears the cookie on the
//! calling client only; a copied token stays valid until it expires.

pub(crate) mod cookies;
pub(crate) mod csrf;
mod error;
pub(crate) mod principal;
pub(crate) mod rate_limit;
pub(crate) mod route_guard;
pub(crate) mod session;
mod state;
pub(crate) mod token;
pub(crate) mod types;
mod users;
mod utils;

pub use error::{AuthError, ErrorBody};
pub use principal::{protected, require_auth, TokenSource, TOKEN_SOURCES};
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitDecision, RateLimitEntry, RateLimitStore, RateLimitSweeper,
    RateLimiter,
};
pub use state::{AuthConfig, AuthState, ConfigError, Environment};
pub use token::{Identity, Role, TokenCodec, TokenError, TokenLifetime};
pub use users::{hash_password, MemoryUserStore, UserRecord, UserStore};

pub(crate) use utils::{normalize_username, valid_username};

#[cfg(test)]
pub(crate) use users::tests::admin_record;
