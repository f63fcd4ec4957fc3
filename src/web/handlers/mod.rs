//! API handlers.

pub mod auth;
pub mod file;
pub mod state;
pub mod verification;

pub use auth::*;
pub use file::*;
pub use state::{mailer_from_config, AppState, SharedDatabase};
pub use verification::*;
