//! Database schema and migrations for sharebox.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded. Timestamp columns hold `YYYY-MM-DD HH:MM:SS.ffffff` UTC text
//! written by the application.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    role        TEXT NOT NULL,           -- 'ops_user', 'client_user'
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    last_login  TEXT
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: email verification tokens, at most one per user
    r#"
CREATE TABLE verification_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);
"#,
    // v3: refresh tokens for session rotation
    r#"
CREATE TABLE refresh_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    revoked_at  TEXT
);

CREATE INDEX idx_refresh_tokens_user ON refresh_tokens(user_id);
CREATE INDEX idx_refresh_tokens_expires ON refresh_tokens(expires_at);
"#,
    // v4: uploaded files
    r#"
CREATE TABLE files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    stored_name     TEXT NOT NULL UNIQUE,
    original_name   TEXT NOT NULL,
    size            INTEGER NOT NULL,
    uploaded_by     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    upload_date     TEXT NOT NULL
);

CREATE INDEX idx_files_uploaded_by ON files(uploaded_by);
"#,
];
