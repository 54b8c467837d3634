//! # Vitrine (marketing site API)
//!
//! `vitrine` serves the public catalog of a marketing website (products and
//! banners) and the admin API that manages it.
//!
//! ## Security perimeter
//!
//! Every mutating admin call crosses the same perimeter:
//!
//! - **Double-submit CSRF:** `GET /api/auth/csrf` sets a script-readable
//!   `csrf_token` cookie; mutating requests must echo it in `x-csrf-token`.
//!   Cookie and header are compared in constant time.
//! - **Session token:** login issues an HS256 JWT stored in the httpOnly
//!   `auth_token` cookie. Nothing is persisted server-side, so a token stays
//!   valid until it expires.
//! - **Login rate limit:** 5 attempts per 15 minutes per client IP, in fixed
//!   windows, answered with `429` and `Retry-After` once exceeded.
//! - **Route guard:** admin page navigations without a session cookie are
//!   redirected to the login page. Real enforcement happens at the API.
//!
//! CSRF is always checked before the session token so a forged request never
//! learns anything about the token.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
