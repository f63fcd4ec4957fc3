//! sharebox - file sharing between ops and client users
//!
//! Ops users upload office documents. Client users verify their email,
//! list files and fetch them through five-minute download links.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod link;
pub mod logging;
pub mod mail;
pub mod verification;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, validate_password, verify_password, FileFilter,
    PasswordError, Registration, RegistrationRequest, SessionIssuer, SessionTokens,
    ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository};
pub use error::{Result, ShareboxError};
pub use link::{DecodedLink, DownloadLinkCodec, LinkDefect};
pub use verification::{Redemption, TokenLifecycle};
pub use web::WebServer;
