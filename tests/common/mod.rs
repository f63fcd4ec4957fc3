//! Test helpers for web API integration tests.
//!
//! Builds the real router over an in-memory database, a temporary storage
//! directory and a recording mailer.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use sharebox::config::Config;
use sharebox::mail::MemoryMailer;
use sharebox::{Database, WebServer};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const PASSWORD: &str = "password123";

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub mailer: Arc<MemoryMailer>,
    pub storage: TempDir,
}

/// Configuration used by every test app before per-test tweaks.
pub fn create_test_config(storage: &TempDir) -> Config {
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.web.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.web.auth_rate_limit = 1000;
    config.web.api_rate_limit = 10_000;
    config.files.storage_path = storage.path().display().to_string();
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn an app after adjusting the default test configuration.
pub async fn spawn_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let storage = TempDir::new().expect("Failed to create storage dir");
    let mut config = create_test_config(&storage);
    adjust(&mut config);

    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let mailer = Arc::new(MemoryMailer::new());

    let web = WebServer::with_mailer(&config, db.clone(), mailer.clone())
        .expect("Failed to build web server");
    let server = TestServer::new(web.router()).expect("Failed to create test server");

    TestApp {
        server,
        db,
        mailer,
        storage,
    }
}

impl TestApp {
    pub async fn signup(&self, email: &str, user_type: &str) -> TestResponse {
        self.server
            .post("/api/signup/")
            .json(&json!({
                "username": email.split('@').next().unwrap_or(email),
                "email": email,
                "password": PASSWORD,
                "user_type": user_type,
            }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/api/login/")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    /// Token from the most recent verification mail sent to `email`.
    pub fn verification_token(&self, email: &str) -> String {
        let mail = self
            .mailer
            .last_to(email)
            .expect("No verification mail was sent");
        mail.body
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .expect("Verification mail has no link")
            .to_string()
    }

    pub async fn verify(&self, token: &str) -> TestResponse {
        self.server
            .get(&format!("/api/email/verify/{token}/"))
            .await
    }

    /// Sign up and log in an ops user, returning the access token.
    pub async fn ops_token(&self, email: &str) -> String {
        self.signup(email, "ops_user").await.assert_status(axum::http::StatusCode::CREATED);
        access_token(&self.login(email, PASSWORD).await.json::<Value>())
    }

    /// Sign up, verify and log in a client user, returning the access token.
    pub async fn client_token(&self, email: &str) -> String {
        self.signup(email, "client_user").await.assert_status(axum::http::StatusCode::CREATED);
        let token = self.verification_token(email);
        self.verify(&token).await.assert_status_ok();
        access_token(&self.login(email, PASSWORD).await.json::<Value>())
    }

    pub async fn upload(&self, token: &str, filename: &str, content: &[u8]) -> TestResponse {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(filename)
                .mime_type(DOCX_MIME),
        );
        self.server
            .post("/api/upload/")
            .add_header(AUTHORIZATION, bearer(token))
            .multipart(form)
            .await
    }

    pub async fn list_files(&self, token: &str) -> TestResponse {
        self.server
            .get("/api/files/")
            .add_header(AUTHORIZATION, bearer(token))
            .await
    }

    pub async fn request_link(&self, token: &str, file_id: i64) -> TestResponse {
        self.server
            .post(&format!("/api/files/{file_id}/download/"))
            .add_header(AUTHORIZATION, bearer(token))
            .await
    }

    /// GET a download link path exactly as returned by the API.
    pub async fn redeem(&self, token: &str, download_link: &str) -> TestResponse {
        self.server
            .get(download_link)
            .add_header(AUTHORIZATION, bearer(token))
            .await
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn access_token(response: &Value) -> String {
    response["access"]
        .as_str()
        .expect("Response has no access token")
        .to_string()
}
