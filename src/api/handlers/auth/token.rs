//! Session token codec (HS256 JWT).
//!
//! Tokens are self-contained: validity is a function of the signature and the
//! `exp` claim only. Nothing is stored server-side, so there is no revocation;
//! clearing the cookie at logout only forgets the token on that client.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{state::Environment, utils::unix_now};

const DAY_SECONDS: u64 = 24 * 60 * 60;
pub const PRODUCTION_TOKEN_TTL_SECONDS: u64 = 7 * DAY_SECONDS;
pub const DEVELOPMENT_TOKEN_TTL_SECONDS: u64 = 30 * DAY_SECONDS;
pub const EXTENDED_TOKEN_TTL_SECONDS: u64 = 90 * DAY_SECONDS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenLifetime {
    /// Environment default: 7 days in production, 30 days elsewhere.
    #[default]
    Standard,
    /// "Remember me" sessions.
    Extended,
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Verified caller identity, derived from the session token on every request.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    standard_ttl_seconds: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("standard_ttl_seconds", &self.standard_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &SecretString, environment: Environment) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat"]);

        let standard_ttl_seconds = if environment.is_production() {
            PRODUCTION_TOKEN_TTL_SECONDS
        } else {
            DEVELOPMENT_TOKEN_TTL_SECONDS
        };

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            standard_ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self, lifetime: TokenLifetime) -> u64 {
        match lifetime {
            TokenLifetime::Standard => self.standard_ttl_seconds,
            TokenLifetime::Extended => EXTENDED_TOKEN_TTL_SECONDS,
        }
    }

    /// Sign a new session token for `identity`.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the claims cannot be encoded.
    pub fn issue(&self, identity: &Identity, lifetime: TokenLifetime) -> Result<String, TokenError> {
        self.issue_at(identity, unix_now(), self.ttl_seconds(lifetime))
    }

    /// Sign a token with an explicit issue time and lifetime.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the claims cannot be encoded.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: u64,
        ttl_seconds: u64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_seconds),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// Check signature and expiry. There is no partial trust: any failure
    /// rejects the whole token.
    ///
    /// # Errors
    /// Returns `TokenError::Expired` past `exp`, `TokenError::Invalid` otherwise.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err.to_string()),
            })
    }
}
