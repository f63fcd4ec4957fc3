//! Authentication module for sharebox.
//!
//! Password hashing, signup, login, bearer sessions and the access policy.

mod credentials;
mod password;
pub mod policy;
mod registration;
mod session;
pub mod validation;

pub use credentials::authenticate;
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use policy::FileFilter;
pub use registration::{register, Registration, RegistrationRequest};
pub use session::{JwtClaims, SessionIssuer, SessionTokens};
pub use validation::ValidationError;
