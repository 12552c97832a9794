//! Authentication layer: password hashing, credential verification and the session gate.

pub mod authenticator;
pub mod middleware;
pub mod password;
pub mod session;

pub use authenticator::Authenticator;
pub use middleware::{authorize, AppState, AuthSession};
pub use password::PasswordHasher;
pub use session::{generate_session_token, is_well_formed_token};

use crate::storage::StoreError;

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are never distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
