//! Persistence of user records.
//!
//! The credential manager only talks to [`UserRepository`]. Implementations
//! must reject a second user with the same email on insert, and must refuse
//! an update whose `version` no longer matches the stored record so that two
//! callers cannot both consume the same token.

mod file;
mod memory;

pub use file::JsonFileUserStore;
pub use memory::{InMemoryUserStore, UserTable};

use thiserror::Error;

use crate::modules::auth::user::{User, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a user with this email already exists")]
    DuplicateEmail,
    #[error("user record was modified concurrently")]
    Conflict,
    #[error("user {0} does not exist")]
    NotFound(UserId),
    #[error("user store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("user store is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Typed lookups and writes over user records
pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError>;
    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user and return it with its assigned id
    fn add(&self, user: User) -> Result<User, StoreError>;

    /// Overwrite the stored record with `user`, failing on a stale version
    fn update(&self, user: &User) -> Result<(), StoreError>;
}

impl<T: UserRepository + ?Sized> UserRepository for std::sync::Arc<T> {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_email(email)
    }

    fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_activation_token(token)
    }

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        (**self).find_by_reset_token(token)
    }

    fn add(&self, user: User) -> Result<User, StoreError> {
        (**self).add(user)
    }

    fn update(&self, user: &User) -> Result<(), StoreError> {
        (**self).update(user)
    }
}
