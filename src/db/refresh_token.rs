//! Refresh token repository for session rotation.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::datetime::to_db_timestamp;
use crate::{Result, ShareboxError};

/// Refresh token entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
    /// Revocation timestamp (None if not revoked).
    pub revoked_at: Option<String>,
}

/// New refresh token for creation.
pub struct NewRefreshToken {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Repository for refresh token operations.
pub struct RefreshTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new refresh token.
    pub async fn create(&self, new_token: &NewRefreshToken) -> Result<RefreshToken> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO refresh_tokens (user_id, token, expires_at, created_at)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(new_token.user_id)
        .bind(&new_token.token)
        .bind(to_db_timestamp(&new_token.expires_at))
        .bind(to_db_timestamp(&Utc::now()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShareboxError::NotFound("Refresh token".into()))
    }

    /// Get a refresh token by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a refresh token that is neither revoked nor expired at `now`.
    pub async fn get_valid_token(&self, token: &str, now: DateTime<Utc>) -> Result<Option<RefreshToken>> {
        let result = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens
             WHERE token = $1
               AND revoked_at IS NULL
               AND expires_at > $2",
        )
        .bind(token)
        .bind(to_db_timestamp(&now))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Revoke a refresh token.
    ///
    /// Returns false if the token was unknown or already revoked, so two
    /// concurrent rotations of the same token cannot both succeed.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $1 WHERE token = $2 AND revoked_at IS NULL",
        )
        .bind(to_db_timestamp(&Utc::now()))
        .bind(token)
        .execute(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke all tokens for a user.
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $1 WHERE user_id = $2 AND revoked_at IS NULL",
        )
        .bind(to_db_timestamp(&Utc::now()))
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete expired and revoked tokens (cleanup).
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1 OR revoked_at IS NOT NULL")
                .bind(to_db_timestamp(&now))
                .execute(self.pool)
                .await
                .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
