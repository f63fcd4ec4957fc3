//! Web API Authentication Tests
//!
//! Integration tests for signup, login and token refresh.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{access_token, spawn_app, spawn_app_with, PASSWORD};
use sharebox::UserRepository;

#[tokio::test]
async fn test_signup_client_sends_verification_mail() {
    let app = spawn_app().await;

    let response = app.signup("client@example.com", "client_user").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], "User created. Please verify your email.");

    let mail = app.mailer.last_to("client@example.com").unwrap();
    assert_eq!(mail.subject, "Verify Your Email");
    assert!(mail
        .body
        .starts_with("Click the link to verify your email: http://localhost:8000/api/email/verify/"));
}

#[tokio::test]
async fn test_signup_ops_skips_verification() {
    let app = spawn_app().await;

    let response = app.signup("ops@example.com", "ops_user").await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["message"], "User created.");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = spawn_app().await;

    app.signup("dup@example.com", "ops_user")
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.signup("DUP@example.com", "client_user").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/signup/")
        .json(&json!({
            "username": "someone",
            "email": "not-an-email",
            "password": "short",
            "user_type": "client_user",
        }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());
}

#[tokio::test]
async fn test_signup_rejects_unknown_user_type() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/signup/")
        .json(&json!({
            "username": "someone",
            "email": "someone@example.com",
            "password": PASSWORD,
            "user_type": "admin",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_ops_user() {
    let app = spawn_app().await;
    app.signup("ops@example.com", "ops_user").await;

    let response = app.login("ops@example.com", PASSWORD).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["message"], "Logged in as Ops User.");
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["expires_in"], 900);
}

#[tokio::test]
async fn test_login_unverified_client_refused() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;

    let response = app.login("client@example.com", PASSWORD).await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"],
        "Please verify your email before logging in."
    );
}

#[tokio::test]
async fn test_login_verified_client() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let token = app.verification_token("client@example.com");
    app.verify(&token).await.assert_status_ok();

    let response = app.login("client@example.com", PASSWORD).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Logged in as Client User."
    );

    let user = UserRepository::new(app.db.pool())
        .get_by_email("client@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = spawn_app().await;
    app.signup("ops@example.com", "ops_user").await;

    let wrong_password = app.login("ops@example.com", "wrong-password").await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<Value>()["error"],
        "Invalid email or password."
    );

    let unknown = app.login("nobody@example.com", PASSWORD).await;
    unknown.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json::<Value>()["error"], "Invalid email or password.");
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = spawn_app().await;
    app.signup("ops@example.com", "ops_user").await;
    let login: Value = app.login("ops@example.com", PASSWORD).await.json();
    let refresh = login["refresh"].as_str().unwrap().to_string();

    let response = app
        .server
        .post("/api/token/refresh/")
        .json(&json!({ "refresh": refresh }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["access"].is_string());
    assert_ne!(body["refresh"].as_str().unwrap(), refresh);

    // The old refresh token is revoked
    let reused = app
        .server
        .post("/api/token/refresh/")
        .json(&json!({ "refresh": refresh }))
        .await;
    reused.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refreshed_access_token_works() {
    let app = spawn_app().await;
    app.signup("ops@example.com", "ops_user").await;
    let login: Value = app.login("ops@example.com", PASSWORD).await.json();

    let refreshed: Value = app
        .server
        .post("/api/token/refresh/")
        .json(&json!({ "refresh": login["refresh"] }))
        .await
        .json();

    app.list_files(&access_token(&refreshed))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let app = spawn_app().await;

    let missing = app.server.get("/api/files/").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["code"], "UNAUTHORIZED");

    let garbage = app.list_files("not-a-jwt").await;
    garbage.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = spawn_app_with(|config| config.web.auth_rate_limit = 2).await;

    app.login("a@example.com", PASSWORD).await;
    app.login("a@example.com", PASSWORD).await;

    let limited = app.login("a@example.com", PASSWORD).await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json::<Value>()["code"], "RATE_LIMITED");

    // Other API routes have their own bucket
    app.server.get("/api/files/").await.assert_status(StatusCode::UNAUTHORIZED);
}

async fn login_forwarded_for(app: &common::TestApp, forwarded: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/login/")
        .add_header(
            axum::http::HeaderName::from_static("x-forwarded-for"),
            axum::http::HeaderValue::from_str(forwarded).unwrap(),
        )
        .json(&json!({ "email": "a@example.com", "password": PASSWORD }))
        .await
}

#[tokio::test]
async fn test_rate_limit_ignores_forwarded_for_by_default() {
    let app = spawn_app_with(|config| config.web.auth_rate_limit = 1).await;

    login_forwarded_for(&app, "10.0.0.1").await;
    login_forwarded_for(&app, "10.0.0.2")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_keys_on_trusted_forwarded_for() {
    let app = spawn_app_with(|config| {
        config.web.auth_rate_limit = 1;
        config.web.trust_proxy_headers = true;
    })
    .await;

    login_forwarded_for(&app, "10.0.0.1").await;
    login_forwarded_for(&app, "10.0.0.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let other = login_forwarded_for(&app, "10.0.0.2").await;
    assert_ne!(other.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_security_headers_and_health() {
    let app = spawn_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = spawn_app().await;

    let response = app.server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let doc: Value = response.json();
    assert!(doc["paths"]["/files/download/{opaque}/"].is_object());
}
