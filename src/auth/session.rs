//! Bearer sessions: JWT access tokens plus stored, rotating refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::{DbPool, NewRefreshToken, RefreshTokenRepository, User, UserRepository};
use crate::{Result, ShareboxError};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: i64,
    pub email: String,
    /// Role as stored (`ops_user` / `client_user`).
    pub role: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Token pair handed to a client after login or refresh.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Issues and rotates sessions.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    access_token_expiry: u64,
    refresh_token_expiry_days: u64,
}

impl SessionIssuer {
    pub fn new(jwt_secret: &str, access_token_expiry: u64, refresh_token_expiry_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry,
            refresh_token_expiry_days,
        }
    }

    /// Sign an access token for `user`.
    pub fn access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to encode JWT: {}", e);
            ShareboxError::Auth("failed to generate token".to_string())
        })
    }

    /// Issue a fresh access/refresh pair for `user`.
    pub async fn issue(&self, pool: &DbPool, user: &User) -> Result<SessionTokens> {
        let access = self.access_token(user)?;
        let refresh = Uuid::new_v4().to_string();

        RefreshTokenRepository::new(pool)
            .create(&NewRefreshToken {
                user_id: user.id,
                token: refresh.clone(),
                expires_at: Utc::now() + Duration::days(self.refresh_token_expiry_days as i64),
            })
            .await?;

        Ok(SessionTokens {
            access,
            refresh,
            expires_in: self.access_token_expiry,
        })
    }

    /// Exchange a refresh token for a new pair. The presented token is revoked.
    pub async fn refresh(&self, pool: &DbPool, refresh_token: &str) -> Result<SessionTokens> {
        let tokens = RefreshTokenRepository::new(pool);

        let stored = tokens
            .get_valid_token(refresh_token, Utc::now())
            .await?
            .ok_or_else(|| ShareboxError::Auth("Invalid or expired refresh token".to_string()))?;

        if !tokens.revoke(refresh_token).await? {
            warn!(user_id = stored.user_id, "Refresh token reused concurrently");
            return Err(ShareboxError::Auth("Invalid or expired refresh token".to_string()));
        }

        let user = UserRepository::new(pool)
            .get_by_id(stored.user_id)
            .await?
            .ok_or_else(|| ShareboxError::Auth("User not found".to_string()))?;

        info!(user_id = user.id, "Session refreshed");
        self.issue(pool, &user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, Role};
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const SECRET: &str = "test-secret";

    async fn setup() -> (Database, User) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("ops", "ops@example.com", "hash", Role::Ops))
            .await
            .unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_access_token_claims() {
        let (_db, user) = setup().await;
        let issuer = SessionIssuer::new(SECRET, 900, 7);

        let token = issuer.access_token(&user).unwrap();
        let decoded = decode::<JwtClaims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user.id);
        assert_eq!(decoded.claims.email, "ops@example.com");
        assert_eq!(decoded.claims.role, "ops_user");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 900);
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let (db, user) = setup().await;
        let issuer = SessionIssuer::new(SECRET, 900, 7);

        let first = issuer.issue(db.pool(), &user).await.unwrap();
        let second = issuer.refresh(db.pool(), &first.refresh).await.unwrap();
        assert_ne!(first.refresh, second.refresh);

        let reused = issuer.refresh(db.pool(), &first.refresh).await;
        assert!(matches!(reused, Err(ShareboxError::Auth(_))));
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let (db, _) = setup().await;
        let issuer = SessionIssuer::new(SECRET, 900, 7);
        let result = issuer.refresh(db.pool(), "no-such-token").await;
        assert!(matches!(result, Err(ShareboxError::Auth(_))));
    }
}
