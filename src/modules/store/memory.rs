use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{StoreError, UserRepository};
use crate::modules::auth::user::{normalize_email, User, UserId};

/// The user records plus the id sequence. Shared by both store backends.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct UserTable {
    users: HashMap<UserId, User>,
    next_id: UserId,
}

impl UserTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.values().find(|u| predicate(*u)).cloned()
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.find(|u| u.email == email)
    }

    pub fn find_by_activation_token(&self, token: &str) -> Option<User> {
        self.find(|u| u.activation_token.as_deref() == Some(token))
    }

    pub fn find_by_reset_token(&self, token: &str) -> Option<User> {
        self.find(|u| u.reset_token.as_ref().map(|r| r.token.as_str()) == Some(token))
    }

    pub fn add(&mut self, mut user: User) -> Result<User, StoreError> {
        user.email = normalize_email(&user.email);
        if self.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        self.next_id += 1;
        user.id = self.next_id;
        user.version = 0;
        self.users.insert(user.id, user.clone());
        debug!("Inserted user id={}", user.id);
        Ok(user)
    }

    pub fn update(&mut self, user: &User) -> Result<(), StoreError> {
        let stored = self
            .users
            .get_mut(&user.id)
            .ok_or(StoreError::NotFound(user.id))?;
        if stored.version != user.version {
            return Err(StoreError::Conflict);
        }

        let mut updated = user.clone();
        updated.version = user.version + 1;
        *stored = updated;
        debug!("Updated user id={} version={}", user.id, user.version + 1);
        Ok(())
    }
}

/// Process-local user store, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: Mutex<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Mutate a stored record in place, bypassing version checks
    #[cfg(test)]
    pub fn modify(&self, id: UserId, change: impl FnOnce(&mut User)) -> Result<(), StoreError> {
        let mut table = self.table.lock();
        let user = table.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        change(user);
        Ok(())
    }
}

impl UserRepository for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_email(email))
    }

    fn find_by_activation_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_activation_token(token))
    }

    fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.lock().find_by_reset_token(token))
    }

    fn add(&self, user: User) -> Result<User, StoreError> {
        self.table.lock().add(user)
    }

    fn update(&self, user: &User) -> Result<(), StoreError> {
        self.table.lock().update(user)
    }
}
