//! Authentication handlers for Web API.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{authenticate, register, RegistrationRequest};
use crate::web::dto::{
    LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RefreshResponse, SignupRequest,
    ValidatedJson,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;

/// POST /api/signup/ - Create an account.
///
/// Client users receive a verification mail.
#[utoipa::path(
    post,
    path = "/signup/",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Email already registered", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request = RegistrationRequest::new(req.username, req.email, req.password, req.user_type);
    let registration = register(
        state.db.pool(),
        state.mailer.as_ref(),
        &state.backend_url,
        request,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(registration.message())),
    ))
}

/// POST /api/login/ - Log in with email and password.
#[utoipa::path(
    post,
    path = "/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 403, description = "Email not verified", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = authenticate(state.db.pool(), &req.email, &req.password).await?;
    let tokens = state.sessions.issue(state.db.pool(), &user).await?;

    Ok(Json(LoginResponse {
        refresh: tokens.refresh,
        access: tokens.access,
        expires_in: tokens.expires_in,
        message: format!("Logged in as {}.", user.role.display_name()),
    }))
}

/// POST /api/token/refresh/ - Exchange a refresh token for a new pair.
#[utoipa::path(
    post,
    path = "/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorBody)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let tokens = state.sessions.refresh(state.db.pool(), &req.refresh).await?;

    Ok(Json(RefreshResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        expires_in: tokens.expires_in,
    }))
}
