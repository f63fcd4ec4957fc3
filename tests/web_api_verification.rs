//! Web API Email Verification Tests

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::Value;

use common::{spawn_app, TestApp, PASSWORD};
use sharebox::db::VerificationTokenRepository;
use sharebox::{TokenLifecycle, User, UserRepository};

async fn load_user(app: &TestApp, email: &str) -> User {
    UserRepository::new(app.db.pool())
        .get_by_email(email)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_verify_email_success() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let token = app.verification_token("client@example.com");

    let response = app.verify(&token).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Email verified successfully."
    );

    let user = load_user(&app, "client@example.com").await;
    assert!(user.is_verified);

    let tokens = VerificationTokenRepository::new(app.db.pool());
    assert!(tokens.get_by_token(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_verify_email_token_single_use() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let token = app.verification_token("client@example.com");

    app.verify(&token).await.assert_status_ok();

    let second = app.verify(&token).await;
    second.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        second.json::<Value>()["error"],
        "Invalid verification token."
    );
}

#[tokio::test]
async fn test_verify_email_unknown_token() {
    let app = spawn_app().await;

    let response = app.verify("00000000-0000-0000-0000-000000000000").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid verification token."
    );
}

#[tokio::test]
async fn test_verify_email_expired_token_is_kept() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let user = load_user(&app, "client@example.com").await;

    let stale = TokenLifecycle::new(app.db.pool())
        .issue_at(&user, Utc::now() - Duration::hours(25))
        .await
        .unwrap();

    let response = app.verify(&stale.token).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Token has expired.");

    let tokens = VerificationTokenRepository::new(app.db.pool());
    assert!(tokens.get_by_token(&stale.token).await.unwrap().is_some());
    assert_eq!(tokens.count().await.unwrap(), 1);
    assert!(!load_user(&app, "client@example.com").await.is_verified);

    // Still expired on a second attempt
    app.verify(&stale.token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reissue_replaces_previous_token() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let first = app.verification_token("client@example.com");
    let user = load_user(&app, "client@example.com").await;

    let fresh = TokenLifecycle::new(app.db.pool()).issue(&user).await.unwrap();
    assert_ne!(fresh.token, first);

    app.verify(&first)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.verify(&fresh.token).await.assert_status_ok();
}

#[tokio::test]
async fn test_verify_already_verified_user() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let token = app.verification_token("client@example.com");
    app.verify(&token).await.assert_status_ok();

    let user = load_user(&app, "client@example.com").await;
    let extra = TokenLifecycle::new(app.db.pool()).issue(&user).await.unwrap();

    let response = app.verify(&extra.token).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Email already verified.");

    // Token is left in place
    let tokens = VerificationTokenRepository::new(app.db.pool());
    assert!(tokens.get_by_token(&extra.token).await.unwrap().is_some());
}

#[tokio::test]
async fn test_verification_unlocks_login() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;

    app.login("client@example.com", PASSWORD)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let token = app.verification_token("client@example.com");
    app.verify(&token).await.assert_status_ok();

    app.login("client@example.com", PASSWORD)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_verify_requires_no_bearer() {
    let app = spawn_app().await;
    app.signup("client@example.com", "client_user").await;
    let token = app.verification_token("client@example.com");

    let response = app
        .server
        .get(&format!("/api/email/verify/{token}/"))
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer garbage".to_string(),
        )
        .await;

    response.assert_status_ok();
}
