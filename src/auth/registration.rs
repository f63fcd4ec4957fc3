//! User signup for sharebox.

use tracing::{info, warn};

use crate::auth::password::{hash_password, PasswordError};
use crate::auth::validation::validate_registration;
use crate::db::{DbPool, NewUser, Role, User, UserRepository, VerificationToken};
use crate::mail::{send_best_effort, verification_mail, MailSender};
use crate::verification::TokenLifecycle;
use crate::{Result, ShareboxError};

/// Signup request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl RegistrationRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role,
        }
    }
}

/// Result of a successful signup.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// Verification token, issued for client users only.
    pub verification: Option<VerificationToken>,
    /// Whether the verification mail was handed to the mail sender.
    pub mail_sent: bool,
}

impl Registration {
    /// Response message shown to the new user.
    pub fn message(&self) -> &'static str {
        if self.verification.is_some() {
            "User created. Please verify your email."
        } else {
            "User created."
        }
    }
}

/// Register a new user.
///
/// 1. Validates the fields
/// 2. Rejects an already registered email
/// 3. Hashes the password and creates the (unverified) user
/// 4. For client users, issues a verification token and mails the link.
///    A failed mail is logged and does not fail the signup.
pub async fn register(
    pool: &DbPool,
    mailer: &dyn MailSender,
    backend_url: &str,
    request: RegistrationRequest,
) -> Result<Registration> {
    let email = request.email.trim().to_string();
    validate_registration(&request.username, &email, &request.password)
        .map_err(|e| ShareboxError::Validation(e.to_string()))?;

    let users = UserRepository::new(pool);
    if users.email_exists(&email).await? {
        return Err(ShareboxError::DuplicateEmail(email));
    }

    let password_hash = hash_password(&request.password).map_err(|e| match e {
        PasswordError::HashError(msg) => ShareboxError::Internal(format!("password hashing failed: {msg}")),
        other => ShareboxError::Validation(other.to_string()),
    })?;

    let user = users
        .create(&NewUser::new(&request.username, &email, password_hash, request.role))
        .await?;
    info!(user_id = user.id, role = %user.role, "New user registered");

    if !user.role.requires_verification() {
        return Ok(Registration {
            user,
            verification: None,
            mail_sent: false,
        });
    }

    let token = TokenLifecycle::new(pool).issue(&user).await?;
    let mail = verification_mail(&user.email, &token.token, backend_url);
    let mail_sent = send_best_effort(mailer, &mail).await;
    if !mail_sent {
        warn!(user_id = user.id, "Verification mail not delivered; user must request a new link");
    }

    Ok(Registration {
        user,
        verification: Some(token),
        mail_sent,
    })
}
