//! Email verification handler.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::verification::{Redemption, TokenLifecycle};
use crate::web::dto::MessageResponse;
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;

/// GET /api/email/verify/{token}/ - Redeem a verification token.
#[utoipa::path(
    get,
    path = "/email/verify/{token}/",
    tag = "auth",
    params(
        ("token" = String, Path, description = "Verification token from the mail")
    ),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Token expired or invalid", body = ErrorBody)
    )
)]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = match TokenLifecycle::new(state.db.pool())
        .validate_and_consume(&token)
        .await?
    {
        Redemption::Verified { .. } => "Email verified successfully.",
        Redemption::AlreadyVerified { .. } => "Email already verified.",
    };

    Ok(Json(MessageResponse::new(message)))
}
