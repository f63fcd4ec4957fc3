//! Error types for sharebox.

use thiserror::Error;

use crate::link::LinkDefect;

/// Common error type for sharebox.
#[derive(Error, Debug)]
pub enum ShareboxError {
    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound mail could not be built or delivered.
    #[error("mail error: {0}")]
    Mail(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Bearer or refresh token rejected.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Unknown email or wrong password.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// Client user tried to log in before verifying their email.
    #[error("Please verify your email before logging in.")]
    UnverifiedAccount,

    /// Signup with an email that is already registered.
    #[error("A user with the email '{0}' already exists.")]
    DuplicateEmail(String),

    /// Upload with an extension outside the allow-list.
    #[error("Only {allowed} files are allowed")]
    UnsupportedFileType { allowed: String },

    /// Verification token exists but is past its expiry.
    #[error("Token has expired.")]
    TokenExpired,

    /// Verification token does not exist (never issued or already consumed).
    #[error("Invalid verification token.")]
    InvalidToken,

    /// Download link decoded fine but its window has passed.
    #[error("The download link has expired.")]
    LinkExpired,

    /// Download link could not be decoded.
    #[error("Invalid download link.")]
    MalformedLink(LinkDefect),

    /// Caller lacks the role or verification state for the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0} not found.")]
    NotFound(String),
}

impl From<sqlx::Error> for ShareboxError {
    fn from(e: sqlx::Error) -> Self {
        ShareboxError::Database(e.to_string())
    }
}

/// Result type alias for sharebox operations.
pub type Result<T> = std::result::Result<T, ShareboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_display() {
        assert_eq!(ShareboxError::TokenExpired.to_string(), "Token has expired.");
        assert_eq!(
            ShareboxError::InvalidToken.to_string(),
            "Invalid verification token."
        );
    }

    #[test]
    fn test_link_error_display() {
        assert_eq!(
            ShareboxError::LinkExpired.to_string(),
            "The download link has expired."
        );
        let err = ShareboxError::MalformedLink(LinkDefect::MissingFields);
        assert_eq!(err.to_string(), "Invalid download link.");
    }

    #[test]
    fn test_unsupported_file_type_display() {
        let err = ShareboxError::UnsupportedFileType {
            allowed: ".pptx, .docx, and .xlsx".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Only .pptx, .docx, and .xlsx files are allowed"
        );
    }

    #[test]
    fn test_not_found_error_display() {
        let err = ShareboxError::NotFound("File".to_string());
        assert_eq!(err.to_string(), "File not found.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShareboxError = io_err.into();
        assert!(matches!(err, ShareboxError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: ShareboxError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ShareboxError::Database(_)));
    }
}
