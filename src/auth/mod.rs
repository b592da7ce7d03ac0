//! Session and token authentication
//!
//! Persistence-backed primitives exposed to plugins and the HTTP layer:
//! account creation, login with salted iterated SHA-256 password hashing,
//! and UUID access/refresh token pairs stored in the tokens table.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::db::{AuthToken, DbPool, TokenRepo, User, UserRepo};
use crate::{Error, Result};

/// Bytes of random salt per password
const SALT_LEN: usize = 16;

/// Authentication service over the user and token repositories
#[derive(Clone)]
pub struct Authentication {
    users: UserRepo,
    tokens: TokenRepo,
    hash_rounds: u32,
}

impl Authentication {
    /// Create the service from a database pool
    #[must_use]
    pub fn new(pool: DbPool, hash_rounds: u32) -> Self {
        Self {
            users: UserRepo::new(pool.clone()),
            tokens: TokenRepo::new(pool),
            // A zero round count would skip hashing entirely
            hash_rounds: hash_rounds.max(1),
        }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns error if the email is taken or the database operation fails
    pub fn register(&self, email: &str, password: &str) -> Result<User> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::Auth("email and password required".to_string()));
        }

        let hash = self.hash_password(password);
        self.users.create(email, &hash)
    }

    /// Log a user in, issuing a fresh token pair
    ///
    /// # Errors
    ///
    /// Returns error if the user is unknown, the password does not match, or
    /// the database operation fails
    pub fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let user = self
            .users
            .find_by_email(email)?
            .ok_or_else(|| Error::Auth("user not found".to_string()))?;

        if !self.verify_password(password, &user.password_hash) {
            return Err(Error::Auth("password does not match".to_string()));
        }

        self.new_token(&user.id)
    }

    /// Issue a token pair for an existing user id
    ///
    /// # Errors
    ///
    /// Returns error if the user does not exist or the database operation
    /// fails
    pub fn new_token(&self, user_id: &str) -> Result<AuthToken> {
        if user_id.is_empty() {
            return Err(Error::Auth("no user id given".to_string()));
        }

        let user = self
            .users
            .find(user_id)?
            .ok_or_else(|| Error::Auth("user not found".to_string()))?;

        self.tokens.issue(&user.id)
    }

    /// Look up a token by access value scoped to a user
    ///
    /// # Errors
    ///
    /// Returns error if no such token exists or the database operation fails
    pub fn token(&self, access: &str, user_id: &str) -> Result<AuthToken> {
        self.tokens
            .find(access, user_id)?
            .ok_or_else(|| Error::Auth("token not found".to_string()))
    }

    /// Resolve an access token to its owning user
    ///
    /// # Errors
    ///
    /// Returns error if the token or its user is unknown
    pub fn verify_access(&self, access: &str) -> Result<User> {
        let token = self
            .tokens
            .find_by_access(access)?
            .ok_or_else(|| Error::Auth("token not found".to_string()))?;

        self.users
            .find(&token.user_id)?
            .ok_or_else(|| Error::Auth("user not found".to_string()))
    }

    /// Log a user out by revoking every token they hold
    ///
    /// # Errors
    ///
    /// Returns error if the database operation fails
    pub fn logout(&self, user_id: &str) -> Result<usize> {
        self.tokens.revoke_for_user(user_id)
    }

    /// Hash a password into `salt$digest` hex form
    #[must_use]
    pub fn hash_password(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = iterate_digest(&salt, password, self.hash_rounds);
        format!("{}${}", hex::encode(salt), hex::encode(digest))
    }

    /// Check a password against a stored `salt$digest` value
    #[must_use]
    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let digest = iterate_digest(&salt, password, self.hash_rounds);
        hex::encode(digest) == digest_hex
    }
}

/// Iterated salted SHA-256
fn iterate_digest(salt: &[u8], password: &str, rounds: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut digest: [u8; 32] = hasher.finalize().into();

    for _ in 1..rounds {
        digest = Sha256::digest(digest).into();
    }

    digest
}
