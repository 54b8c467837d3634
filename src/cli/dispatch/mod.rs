//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        jwt_secret: auth_opts.jwt_secret,
        environment: auth_opts.environment,
        admin: auth_opts.admin,
        login_rate_limit: auth_opts.login_rate_limit,
        login_rate_window_seconds: auth_opts.login_rate_window_seconds,
        rate_limit_sweep_seconds: auth_opts.rate_limit_sweep_seconds,
    }))
}
