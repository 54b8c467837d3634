use crate::{
    api::{
        self,
        handlers::{
            auth::{AuthConfig, AuthState, Environment, MemoryUserStore, RateLimiter, UserRecord},
            catalog::{MemoryCatalogStore, SharedCatalog},
        },
    },
    cli::{commands::auth::AdminAccount, telemetry},
};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub jwt_secret: SecretString,
    pub environment: Environment,
    pub admin: Option<AdminAccount>,
    pub login_rate_limit: u32,
    pub login_rate_window_seconds: u64,
    pub rate_limit_sweep_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the auth configuration is rejected or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let port = args.port;
    let auth_state = Arc::new(auth_state(args)?);
    let catalog: SharedCatalog = Arc::new(MemoryCatalogStore::new());

    info!(
        environment = %auth_state.config().environment(),
        "Starting vitrine"
    );

    let result = api::new(port, auth_state, catalog).await;

    telemetry::shutdown_tracer();

    result
}

/// Build the shared auth state from CLI arguments.
///
/// # Errors
/// Returns an error if the signing secret is unacceptable for the environment,
/// the rate limit is zero, or the admin password hash cannot be parsed.
pub fn auth_state(args: Args) -> Result<AuthState> {
    let config = AuthConfig::new(args.jwt_secret, args.environment)
        .context("invalid --jwt-secret")?
        .with_login_rate_limit(
            args.login_rate_limit,
            Duration::from_secs(args.login_rate_window_seconds),
        )
        .context("invalid login rate limit")?
        .with_sweep_interval(Duration::from_secs(args.rate_limit_sweep_seconds));

    let records = match args.admin {
        Some(admin) => vec![admin_record(admin)],
        None => {
            warn!("no admin account configured: every login attempt will fail");
            Vec::new()
        }
    };
    let users = MemoryUserStore::new(records).context("invalid admin account")?;

    Ok(AuthState::new(config, RateLimiter::default(), Arc::new(users)))
}

fn admin_record(admin: AdminAccount) -> UserRecord {
    // Stable id so sessions survive restarts with the same username.
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, admin.username.as_bytes());
    UserRecord {
        id,
        username: admin.username,
        role: admin.role,
        password_hash: admin.password_hash.expose_secret().to_string(),
    }
}
