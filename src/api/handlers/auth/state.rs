//! Auth configuration and shared state.

use secrecy::{ExposeSecret, SecretString};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tracing::warn;

use super::{
    cookies::CookieStore,
    rate_limit::{RateLimiter, LOGIN_LIMIT, LOGIN_WINDOW, SWEEP_INTERVAL},
    token::TokenCodec,
    users::UserStore,
};

pub const MIN_SECRET_LENGTH: usize = 32;

/// Secrets copied from templates and docs; never acceptable in production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "changeme",
    "change-me",
    "secret",
    "your-secret-key",
    "your-jwt-secret",
    "your-super-secret-jwt-key-change-this-in-production",
    "default-secret-change-in-production",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("signing secret must be at least {MIN_SECRET_LENGTH} bytes, got {0}")]
    SecretTooShort(usize),
    #[error("signing secret is a known placeholder value")]
    PlaceholderSecret,
    #[error("login rate limit must be greater than zero")]
    InvalidRateLimit,
}

fn is_placeholder(secret: &str) -> bool {
    let normalized = secret.trim().to_lowercase();
    PLACEHOLDER_SECRETS.contains(&normalized.as_str())
}

/// Check the signing secret. Production refuses weak secrets outright; other
/// environments only warn so local setups stay easy.
///
/// # Errors
/// Returns `ConfigError` in production when the secret is short or a placeholder.
pub fn validate_secret(secret: &SecretString, environment: Environment) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    let problem = if is_placeholder(value) {
        Some(ConfigError::PlaceholderSecret)
    } else if value.len() < MIN_SECRET_LENGTH {
        Some(ConfigError::SecretTooShort(value.len()))
    } else {
        None
    };

    match problem {
        Some(err) if environment.is_production() => Err(err),
        Some(err) => {
            warn!("weak signing secret accepted outside production: {err}");
            Ok(())
        }
        None => Ok(()),
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret: SecretString,
    environment: Environment,
    login_limit: u32,
    login_window: Duration,
    sweep_interval: Duration,
}

impl AuthConfig {
    /// Build a validated config.
    ///
    /// # Errors
    /// Returns `ConfigError` if the secret is rejected for this environment.
    pub fn new(secret: SecretString, environment: Environment) -> Result<Self, ConfigError> {
        validate_secret(&secret, environment)?;
        Ok(Self {
            secret,
            environment,
            login_limit: LOGIN_LIMIT,
            login_window: LOGIN_WINDOW,
            sweep_interval: SWEEP_INTERVAL,
        })
    }

    /// Override the login rate limit.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidRateLimit` for a zero limit or window.
    pub fn with_login_rate_limit(mut self, limit: u32, window: Duration) -> Result<Self, ConfigError> {
        if limit == 0 || window.is_zero() {
            return Err(ConfigError::InvalidRateLimit);
        }
        self.login_limit = limit;
        self.login_window = window;
        Ok(self)
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.sweep_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn login_limit(&self) -> u32 {
        self.login_limit
    }

    #[must_use]
    pub fn login_window(&self) -> Duration {
        self.login_window
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Cookies are only marked `Secure` in production.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.environment.is_production()
    }

    pub(super) fn secret(&self) -> &SecretString {
        &self.secret
    }
}

pub struct AuthState {
    config: AuthConfig,
    tokens: TokenCodec,
    cookies: CookieStore,
    rate_limiter: RateLimiter,
    users: Arc<dyn UserStore>,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("cookies", &self.cookies)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, rate_limiter: RateLimiter, users: Arc<dyn UserStore>) -> Self {
        let tokens = TokenCodec::new(config.secret(), config.environment());
        let cookies = CookieStore::new(config.cookie_secure());
        Self {
            config,
            tokens,
            cookies,
            rate_limiter,
            users,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub(super) fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRONG: &str = "a-strong-signing-secret-of-40-characters!";

    #[test]
    fn production_rejects_short_secret() {
        let result = AuthConfig::new(SecretString::from("short"), Environment::Production);
        assert_eq!(result.err(), Some(ConfigError::SecretTooShort(5)));
    }

    #[test]
    fn production_rejects_placeholder_secret() {
        let result = AuthConfig::new(
            SecretString::from("your-super-secret-jwt-key-change-this-in-production"),
            Environment::Production,
        );
        assert_eq!(result.err(), Some(ConfigError::PlaceholderSecret));
    }

    #[test]
    fn development_accepts_weak_secret() {
        let result = AuthConfig::new(SecretString::from("secret"), Environment::Development);
        assert!(result.is_ok());
    }

    #[test]
    fn defaults_and_overrides() -> Result<(), ConfigError> {
        let config = AuthConfig::new(SecretString::from(STRONG), Environment::Production)?;
        assert_eq!(config.login_limit(), LOGIN_LIMIT);
        assert_eq!(config.login_window(), LOGIN_WINDOW);
        assert_eq!(config.sweep_interval(), SWEEP_INTERVAL);
        assert!(config.cookie_secure());

        let config = config
            .with_login_rate_limit(10, Duration::from_secs(60))?
            .with_sweep_interval(Duration::from_secs(30));
        assert_eq!(config.login_limit(), 10);
        assert_eq!(config.login_window(), Duration::from_secs(60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        Ok(())
    }

    #[test]
    fn zero_rate_limit_is_rejected() -> Result<(), ConfigError> {
        let config = AuthConfig::new(SecretString::from(STRONG), Environment::Test)?;
        assert_eq!(
            config
                .with_login_rate_limit(0, Duration::from_secs(60))
                .err(),
            Some(ConfigError::InvalidRateLimit)
        );
        Ok(())
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!(
            "Development".parse::<Environment>(),
            Ok(Environment::Development)
        );
        assert!("staging".parse::<Environment>().is_err());
        assert!(!Environment::Test.is_production());
    }
}
