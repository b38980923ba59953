pub mod error;
pub mod manager;
pub mod password;
pub mod tokens;
pub mod user;

// Re-export the main types and functions
pub use error::AuthError;
pub use manager::{CredentialManager, ManagerSettings};
pub use password::{HashedPassword, PasswordHasher};
pub use tokens::{is_token_valid, ResetToken, TokenGenerator};
pub use user::{normalize_email, AccountState, User, UserId};
