//! Admin credential lookup and password verification.
//!
//! Passwords are stored as argon2 PHC strings. When a username is unknown we
//! still run a full verification against a dummy hash so response timing does
//! not tell "no such user" apart from "wrong password".

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    token::{Identity, Role},
    utils::normalize_username,
};

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

impl UserRecord {
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Verify a username/password pair. `Ok(None)` covers both unknown users
    /// and wrong passwords.
    async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<Identity>>;
}

/// Hash a password with argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with(password, Argon2::default())
}

/// Hash a password with explicit argon2 parameters.
///
/// # Errors
/// Returns an error if the parameters are invalid or hashing fails.
pub fn hash_password_with_params(password: &str, params: Params) -> Result<String> {
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
    hash_password_with(password, argon2)
}

fn hash_password_with(password: &str, argon2: Argon2<'_>) -> Result<String> {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|err| anyhow!("invalid salt: {err}"))?;
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[derive(Debug)]
pub struct MemoryUserStore {
    users: HashMap<String, UserRecord>,
    dummy_hash: String,
}

impl MemoryUserStore {
    /// Build a store from user records. Every hash must be a valid PHC string.
    ///
    /// # Errors
    /// Returns an error if a password hash cannot be parsed or the dummy hash
    /// cannot be generated.
    pub fn new(records: Vec<UserRecord>) -> Result<Self> {
        let mut users = HashMap::with_capacity(records.len());
        // Match the cost of real hashes so unknown users take as long.
        let mut params = None;
        for record in records {
            let parsed = PasswordHash::new(&record.password_hash)
                .map_err(|err| anyhow!("invalid password hash for {}: {err}", record.username))?;
            if params.is_none() {
                params = Some(
                    Params::try_from(&parsed)
                        .map_err(|err| anyhow!("invalid argon2 params: {err}"))?,
                );
            }
            users.insert(normalize_username(&record.username), record);
        }

        let dummy_hash = match params {
            Some(params) => hash_password_with_params("dummy-password", params),
            None => hash_password("dummy-password"),
        }
        .context("failed to build dummy password hash")?;

        Ok(Self { users, dummy_hash })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.get(&normalize_username(username)).cloned())
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<Identity>> {
        let Some(record) = self.find_by_username(username).await? else {
            let _ = verify_password(password, &self.dummy_hash);
            return Ok(None);
        };

        if verify_password(password, &record.password_hash) {
            Ok(Some(record.identity()))
        } else {
            Ok(None)
        }
    }
}
