//! Access/refresh token repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// A persisted access/refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
    pub id: String,
    pub user_id: String,
    pub access: String,
    pub refresh: String,
    pub created_at: DateTime<Utc>,
}

/// Token repository
#[derive(Clone)]
pub struct TokenRepo {
    pool: DbPool,
}

impl TokenRepo {
    /// Create a new token repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Issue and persist a fresh token pair for a user
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn issue(&self, user_id: &str) -> Result<AuthToken> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let token = AuthToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            access: Uuid::new_v4().to_string(),
            refresh: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO tokens (id, user_id, access, refresh, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            [
                &token.id,
                &token.user_id,
                &token.access,
                &token.refresh,
                &token.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(token)
    }

    /// Find a token by its access value (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find_by_access(&self, access: &str) -> Result<Option<AuthToken>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let token = conn
            .query_row(
                "SELECT id, user_id, access, refresh, created_at FROM tokens WHERE access = ?1",
                [access],
                row_to_token,
            )
            .ok();

        Ok(token)
    }

    /// Find a token by access value scoped to a user (returns None if not
    /// found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, access: &str, user_id: &str) -> Result<Option<AuthToken>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let token = conn
            .query_row(
                "SELECT id, user_id, access, refresh, created_at FROM tokens
                 WHERE access = ?1 AND user_id = ?2",
                [access, user_id],
                row_to_token,
            )
            .ok();

        Ok(token)
    }

    /// Delete all tokens for a user, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn revoke_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let removed = conn
            .execute("DELETE FROM tokens WHERE user_id = ?1", [user_id])
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(removed)
    }
}

fn row_to_token(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        id: row.get(0)?,
        user_id: row.get(1)?,
        access: row.get(2)?,
        refresh: row.get(3)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(4)?)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
    })
}
