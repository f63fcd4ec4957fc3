//! Validated JSON extraction for request DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

/// `Json<T>` that also runs `T::validate`.
///
/// Body and syntax problems become 400s. Field rule failures become a 422
/// with per-field messages in `details`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected a JSON request body")
        }
        // Wrong types or unknown enum values, e.g. an invalid user_type
        JsonRejection::JsonDataError(e) => ApiError::bad_request(e.body_text()),
        other => ApiError::bad_request(format!("Invalid JSON: {}", other.body_text())),
    }
}

/// Display names must contain something visible and no control characters.
pub fn display_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Username must not be blank".into()));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new("control_chars")
            .with_message("Username must not contain control characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_accepts_ordinary_names() {
        assert!(display_name("Ops Team").is_ok());
        assert!(display_name("  padded  ").is_ok());
        assert!(display_name("Zoë Ångström").is_ok());
    }

    #[test]
    fn test_display_name_rejects_blank() {
        let err = display_name(" \t ").unwrap_err();
        assert_eq!(err.code, "blank");
        assert!(display_name("").is_err());
    }

    #[test]
    fn test_display_name_rejects_control_chars() {
        for name in ["line\nbreak", "nul\x00byte", "esc\x1b[0m"] {
            let err = display_name(name).unwrap_err();
            assert_eq!(err.code, "control_chars", "{name:?}");
        }
    }
}
