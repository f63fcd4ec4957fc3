//! Email verification token repository.
//!
//! Each user owns at most one token. Issuing again replaces the previous
//! token in place. Expired tokens stay until replaced or consumed.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use super::DbPool;
use crate::datetime::{parse_db_timestamp, to_db_timestamp};
use crate::{Result, ShareboxError};

const TOKEN_COLUMNS: &str = "id, user_id, token, created_at, expires_at";

/// Verification token entity.
///
/// Timestamps are parsed from their stored text form when the row is loaded.
#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub id: i64,
    pub user_id: i64,
    /// Opaque UUID v4 value sent in the verification mail.
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    /// True once `now` is strictly past the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

fn timestamp_column(row: &SqliteRow, column: &str) -> sqlx::Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_db_timestamp(&raw).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("invalid timestamp: {raw}").into(),
    })
}

impl<'r> FromRow<'r, SqliteRow> for VerificationToken {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            created_at: timestamp_column(row, "created_at")?,
            expires_at: timestamp_column(row, "expires_at")?,
        })
    }
}

/// New verification token for creation.
pub struct NewVerificationToken {
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for verification token operations.
pub struct VerificationTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> VerificationTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a token for the user, replacing any token they already hold.
    pub async fn upsert(&self, new_token: &NewVerificationToken) -> Result<VerificationToken> {
        let sql = format!(
            "INSERT INTO verification_tokens (user_id, token, created_at, expires_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT(user_id) DO UPDATE SET
                token = excluded.token,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
             RETURNING {TOKEN_COLUMNS}"
        );
        let token = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(new_token.user_id)
            .bind(&new_token.token)
            .bind(to_db_timestamp(&new_token.created_at))
            .bind(to_db_timestamp(&new_token.expires_at))
            .fetch_one(self.pool)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a token by its value.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<VerificationToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM verification_tokens WHERE token = $1");
        let result = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(token)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Atomically delete a live token and mark its owner verified.
    ///
    /// The delete only matches a token that has not expired at `now` and
    /// whose owner is still unverified, so among concurrent callers at most
    /// one gets `Some`. The user update commits in the same transaction.
    pub async fn consume(&self, token: &str, now: DateTime<Utc>) -> Result<Option<VerificationToken>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        let sql = format!(
            "DELETE FROM verification_tokens
             WHERE token = $1
               AND expires_at >= $2
               AND user_id IN (SELECT id FROM users WHERE is_verified = 0)
             RETURNING {TOKEN_COLUMNS}"
        );
        let consumed = sqlx::query_as::<_, VerificationToken>(&sql)
            .bind(token)
            .bind(to_db_timestamp(&now))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        if let Some(ref record) = consumed {
            sqlx::query("UPDATE users SET is_verified = 1 WHERE id = $1")
                .bind(record.user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| ShareboxError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(consumed)
    }

    /// Number of stored tokens.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_tokens")
            .fetch_one(self.pool)
            .await
            .map_err(|e| ShareboxError::Database(e.to_string()))?;

        Ok(count)
    }
}
