//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{
    list_files, login, redeem_download_link, refresh, request_download_link, signup,
    upload_file, verify_email, AppState,
};
use super::middleware::{
    api_rate_limit, auth_rate_limit, create_cors_layer, jwt_auth, security_headers, JwtState,
    RateLimitState,
};
use super::openapi::ApiDoc;

/// Multipart framing allowance on top of the configured upload size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limits: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let upload_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Signup and login share the stricter per-IP limit
    let auth_limits = rate_limits.clone();
    let auth_routes = Router::new()
        .route("/signup/", post(signup))
        .route("/login/", post(login))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = auth_limits.clone();
            auth_rate_limit(state, req, next)
        }));

    let api_limits = rate_limits;
    let api_routes = Router::new()
        .route("/token/refresh/", post(refresh))
        .route("/email/verify/:token/", get(verify_email))
        .route(
            "/upload/",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/", get(list_files))
        .route("/files/:id/download/", post(request_download_link))
        .route("/files/download/:opaque/", get(redeem_download_link))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = api_limits.clone();
            api_rate_limit(state, req, next)
        }));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", auth_routes.merge(api_routes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
        .merge(create_openapi_router())
        .layer(middleware::from_fn(security_headers))
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Serve the OpenAPI document as JSON.
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_router() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_openapi_router() {
        let response = create_openapi_router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/signup/"].is_object());
    }
}
