//! Email and password login.

use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::db::{DbPool, User, UserRepository};
use crate::{Result, ShareboxError};

/// Check `email`/`password` and return the user.
///
/// Unknown emails and wrong passwords both yield `InvalidCredentials`.
/// Client users must have verified their email (`UnverifiedAccount`).
/// Ops users are not gated on verification.
pub async fn authenticate(pool: &DbPool, email: &str, password: &str) -> Result<User> {
    let users = UserRepository::new(pool);

    let Some(user) = users.get_by_email(email.trim()).await? else {
        return Err(ShareboxError::InvalidCredentials);
    };

    if verify_password(password, &user.password).is_err() {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(ShareboxError::InvalidCredentials);
    }

    if user.role.requires_verification() && !user.is_verified {
        info!(user_id = user.id, "Login refused: email not verified");
        return Err(ShareboxError::UnverifiedAccount);
    }

    users.update_last_login(user.id).await?;
    info!(user_id = user.id, role = %user.role, "User logged in");
    Ok(user)
}
