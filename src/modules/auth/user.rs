use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::password::HashedPassword;
use super::tokens::ResetToken;

/// Opaque primary key, assigned by the user store on insert
pub type UserId = u64;

/// Where an account sits in its credential lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    PendingActivation,
    Active,
    ResetPending,
}

/// A registered account and its credential material
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Zero until the store assigns one
    pub id: UserId,
    /// Always stored normalized, see [`normalize_email`]
    pub email: String,
    password_hash: String,
    salt: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub activation_token: Option<String>,
    pub reset_token: Option<ResetToken>,
    /// Optimistic concurrency counter, bumped by the store on every update
    #[serde(default)]
    pub version: u64,
}

impl User {
    /// Build a fresh, inactive account awaiting activation
    pub fn new(
        email: &str,
        password: HashedPassword,
        activation_token: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            email: normalize_email(email),
            password_hash: password.hash,
            salt: password.salt,
            created_at,
            is_active: false,
            activation_token: Some(activation_token),
            reset_token: None,
            version: 0,
        }
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Replace hash and salt as one unit
    pub fn set_password(&mut self, password: HashedPassword) {
        self.password_hash = password.hash;
        self.salt = password.salt;
    }

    pub fn state(&self) -> AccountState {
        if !self.is_active {
            AccountState::PendingActivation
        } else if self.reset_token.is_some() {
            AccountState::ResetPending
        } else {
            AccountState::Active
        }
    }
}

/// Emails are matched case-insensitively and without surrounding whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user() -> User {
        User::new(
            " Test@Example.COM ",
            HashedPassword {
                hash: "1$00".to_string(),
                salt: "salt".to_string(),
            },
            "activation".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_user_is_pending_activation() {
        let user = sample_user();
        assert_eq!(user.email, "test@example.com");
        assert!(!user.is_active);
        assert_eq!(user.activation_token.as_deref(), Some("activation"));
        assert!(user.reset_token.is_none());
        assert_eq!(user.state(), AccountState::PendingActivation);
    }

    #[test]
    fn test_set_password_replaces_both_halves() {
        let mut user = sample_user();
        user.set_password(HashedPassword {
            hash: "2$ff".to_string(),
            salt: "other".to_string(),
        });
        assert_eq!(user.password_hash(), "2$ff");
        assert_eq!(user.salt(), "other");
    }

    #[test]
    fn test_state_transitions() {
        let mut user = sample_user();
        user.is_active = true;
        user.activation_token = None;
        assert_eq!(user.state(), AccountState::Active);

        user.reset_token = Some(ResetToken {
            token: "reset".to_string(),
            expires_at: Utc::now() + Duration::hours(24),
        });
        assert_eq!(user.state(), AccountState::ResetPending);
    }

    #[test]
    fn test_user_serialization_round_trip() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }
}
