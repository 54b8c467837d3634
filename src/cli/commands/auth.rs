use crate::api::handlers::auth::{
    normalize_username, rate_limit::LOGIN_LIMIT, valid_username, Environment, Role,
};
use anyhow::bail;
use clap::{builder::ValueParser, Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_ADMIN_USERNAME: &str = "admin-username";
pub const ARG_ADMIN_PASSWORD_HASH: &str = "admin-password-hash";
pub const ARG_ADMIN_ROLE: &str = "admin-role";
pub const ARG_LOGIN_RATE_LIMIT: &str = "login-rate-limit";
pub const ARG_LOGIN_RATE_WINDOW_SECONDS: &str = "login-rate-window-seconds";
pub const ARG_RATE_LIMIT_SWEEP_SECONDS: &str = "rate-limit-sweep-seconds";

/// Bootstrap admin account configured from the command line.
#[derive(Debug)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: SecretString,
    pub role: Role,
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub environment: Environment,
    pub admin: Option<AdminAccount>,
    pub login_rate_limit: u32,
    pub login_rate_window_seconds: u64,
    pub rate_limit_sweep_seconds: u64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or the admin account
    /// is malformed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(jwt_secret) = get_non_empty(ARG_JWT_SECRET) else {
            bail!("missing required argument: --{ARG_JWT_SECRET}");
        };

        let admin = match (
            get_non_empty(ARG_ADMIN_USERNAME),
            get_non_empty(ARG_ADMIN_PASSWORD_HASH),
        ) {
            (Some(username), Some(password_hash)) => {
                let username = normalize_username(&username);
                if !valid_username(&username) {
                    bail!("invalid --{ARG_ADMIN_USERNAME}: use 3-64 of [a-z0-9._-]");
                }
                Some(AdminAccount {
                    username,
                    password_hash: SecretString::from(password_hash),
                    role: matches
                        .get_one::<Role>(ARG_ADMIN_ROLE)
                        .copied()
                        .unwrap_or(Role::Admin),
                })
            }
            (None, None) => None,
            (Some(_), None) => bail!("missing required argument: --{ARG_ADMIN_PASSWORD_HASH}"),
            (None, Some(_)) => bail!("missing required argument: --{ARG_ADMIN_USERNAME}"),
        };

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            environment: matches
                .get_one::<Environment>(ARG_ENVIRONMENT)
                .copied()
                .unwrap_or_default(),
            admin,
            login_rate_limit: matches
                .get_one::<u32>(ARG_LOGIN_RATE_LIMIT)
                .copied()
                .unwrap_or(LOGIN_LIMIT),
            login_rate_window_seconds: matches
                .get_one::<u64>(ARG_LOGIN_RATE_WINDOW_SECONDS)
                .copied()
                .unwrap_or(900),
            rate_limit_sweep_seconds: matches
                .get_one::<u64>(ARG_RATE_LIMIT_SWEEP_SECONDS)
                .copied()
                .unwrap_or(300),
        })
    }
}

fn environment_parser() -> ValueParser {
    ValueParser::from(|value: &str| value.parse::<Environment>())
}

fn role_parser() -> ValueParser {
    ValueParser::from(|value: &str| value.parse::<Role>())
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    let command = with_admin_args(command);
    with_rate_limit_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HS256 signing secret for session tokens (at least 32 bytes in production)")
                .env("VITRINE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment: production, development, test")
                .env("VITRINE_ENVIRONMENT")
                .default_value("development")
                .value_parser(environment_parser()),
        )
}

fn with_admin_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_USERNAME)
                .long(ARG_ADMIN_USERNAME)
                .help("Username of the bootstrap admin account")
                .env("VITRINE_ADMIN_USERNAME"),
        )
        .arg(
            Arg::new(ARG_ADMIN_PASSWORD_HASH)
                .long(ARG_ADMIN_PASSWORD_HASH)
                .help("Argon2 PHC hash of the bootstrap admin password")
                .env("VITRINE_ADMIN_PASSWORD_HASH")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ADMIN_ROLE)
                .long(ARG_ADMIN_ROLE)
                .help("Role of the bootstrap admin account: admin, editor")
                .env("VITRINE_ADMIN_ROLE")
                .default_value("admin")
                .value_parser(role_parser()),
        )
}

fn with_rate_limit_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_LOGIN_RATE_LIMIT)
                .long(ARG_LOGIN_RATE_LIMIT)
                .help("Login attempts allowed per client per window")
                .env("VITRINE_LOGIN_RATE_LIMIT")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_LOGIN_RATE_WINDOW_SECONDS)
                .long(ARG_LOGIN_RATE_WINDOW_SECONDS)
                .help("Login rate limit window in seconds")
                .env("VITRINE_LOGIN_RATE_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_SWEEP_SECONDS)
                .long(ARG_RATE_LIMIT_SWEEP_SECONDS)
                .help("Interval in seconds between sweeps of expired rate limit entries")
                .env("VITRINE_RATE_LIMIT_SWEEP_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
