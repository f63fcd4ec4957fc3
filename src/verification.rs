//! Email verification token lifecycle.
//!
//! Tokens are issued at signup for client users, expire 24 hours later and
//! can be consumed exactly once. An expired token is reported as such and
//! left in storage. Only a fresh issue replaces it.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{
    DbPool, NewVerificationToken, User, UserRepository, VerificationToken,
    VerificationTokenRepository,
};
use crate::{Result, ShareboxError};

/// How long an issued verification token stays valid.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Validity window of a verification token.
pub fn token_validity() -> Duration {
    Duration::hours(TOKEN_VALIDITY_HOURS)
}

/// Successful outcome of presenting a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// The token was consumed and the user is now verified.
    Verified { user_id: i64 },
    /// The user was verified already. Nothing changed and the token was kept.
    AlreadyVerified { user_id: i64 },
}

/// Pure expiry predicate with an explicit clock.
pub fn is_expired_at(record: &VerificationToken, now: DateTime<Utc>) -> bool {
    record.is_expired_at(now)
}

/// Pure expiry predicate against the current time.
pub fn is_expired(record: &VerificationToken) -> bool {
    is_expired_at(record, Utc::now())
}

/// Issues and redeems verification tokens.
pub struct TokenLifecycle<'a> {
    pool: &'a DbPool,
}

impl<'a> TokenLifecycle<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Issue a token for `user`, valid for 24 hours from now.
    pub async fn issue(&self, user: &User) -> Result<VerificationToken> {
        self.issue_at(user, Utc::now()).await
    }

    /// Issue a token for `user` as of `now`, replacing any token they hold.
    ///
    /// `now` is truncated to the stored microsecond precision, so the
    /// returned record matches what a later load sees.
    pub async fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<VerificationToken> {
        let now = now.trunc_subsecs(6);
        let new_token = NewVerificationToken {
            user_id: user.id,
            token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + token_validity(),
        };

        let record = VerificationTokenRepository::new(self.pool)
            .upsert(&new_token)
            .await?;
        info!(user_id = user.id, expires_at = %record.expires_at, "Issued verification token");
        Ok(record)
    }

    /// Redeem `token` against the current time.
    pub async fn validate_and_consume(&self, token: &str) -> Result<Redemption> {
        self.validate_and_consume_at(token, Utc::now()).await
    }

    /// Redeem `token` as of `now`.
    ///
    /// - unknown token: `InvalidToken`
    /// - expired token: `TokenExpired`, record kept
    /// - owner already verified: `AlreadyVerified`, record kept
    /// - otherwise the record is deleted and the owner verified atomically
    pub async fn validate_and_consume_at(&self, token: &str, now: DateTime<Utc>) -> Result<Redemption> {
        let tokens = VerificationTokenRepository::new(self.pool);

        let record = tokens
            .get_by_token(token)
            .await?
            .ok_or(ShareboxError::InvalidToken)?;
        if let Some(settled) = self.settled_outcome(&record, now).await? {
            return Ok(settled);
        }

        match tokens.consume(token, now).await? {
            Some(consumed) => {
                info!(user_id = consumed.user_id, "Email verified");
                Ok(Redemption::Verified {
                    user_id: consumed.user_id,
                })
            }
            None => {
                // Lost a race. Report what the store looks like now.
                debug!(user_id = record.user_id, "Verification token consumed concurrently");
                let current = tokens
                    .get_by_token(token)
                    .await?
                    .ok_or(ShareboxError::InvalidToken)?;
                self.settled_outcome(&current, now)
                    .await?
                    .ok_or(ShareboxError::InvalidToken)
            }
        }
    }

    /// Outcome for a record that must not be consumed, or `None` if it is redeemable.
    async fn settled_outcome(
        &self,
        record: &VerificationToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Redemption>> {
        if record.is_expired_at(now) {
            info!(user_id = record.user_id, "Verification token expired");
            return Err(ShareboxError::TokenExpired);
        }

        let owner = UserRepository::new(self.pool)
            .get_by_id(record.user_id)
            .await?
            .ok_or(ShareboxError::InvalidToken)?;
        if owner.is_verified {
            return Ok(Some(Redemption::AlreadyVerified { user_id: owner.id }));
        }
        Ok(None)
    }
}
