use thiserror::Error;

use crate::modules::store::StoreError;

/// Every way a credential operation can fail
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("this email is already registered")]
    AlreadyExists,
    #[error("no account exists for this email")]
    NotFound,
    #[error("incorrect password")]
    InvalidCredentials,
    #[error("invalid activation token")]
    InvalidToken,
    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,
    /// The clock is so close to the end of representable time that no expiry can be set
    #[error("reset token expiry is out of range")]
    ExpiryOutOfRange,
    /// The user store itself failed; not a statement about the credentials
    #[error("user store failure: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Stable identifier for callers mapping errors onto their own responses
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::AlreadyExists => "already_exists",
            AuthError::NotFound => "not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::InvalidOrExpiredToken => "invalid_or_expired_token",
            AuthError::ExpiryOutOfRange => "expiry_out_of_range",
            AuthError::Storage(_) => "storage",
        }
    }
}
