use chrono::Duration;
use log::{debug, error};
use std::sync::Arc;

use super::error::AuthError;
use super::password::{HashedPassword, PasswordHasher};
use super::tokens::{ResetToken, TokenGenerator};
use super::user::{normalize_email, AccountState, User};
use crate::modules::config::{reset_token_ttl, AuthConfig, ConfigError};
use crate::modules::email::{build_link, EmailError, Notifier};
use crate::modules::store::{StoreError, UserRepository};
use crate::modules::utils::logging::{format_sensitive, log_auth_event};
use crate::modules::utils::time::{Clock, SystemClock};

/// The knobs [`CredentialManager`] needs from the wider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    pub activation_base_url: String,
    pub reset_base_url: String,
    pub reset_token_ttl_hours: i64,
    pub hash_iterations: u32,
}

impl From<&AuthConfig> for ManagerSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            activation_base_url: config.activation_base_url.clone(),
            reset_base_url: config.reset_base_url.clone(),
            reset_token_ttl_hours: config.reset_token_ttl_hours,
            hash_iterations: config.hash_iterations,
        }
    }
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

/// Registration, login, activation and password reset over a user store.
///
/// Every operation is a lookup followed by at most one write. Lost races
/// against another caller surface as the error the operation would raise
/// on its own (`AlreadyExists`, `InvalidToken`, `InvalidOrExpiredToken`).
///
/// Notification failures are logged and otherwise ignored: the state change
/// has already been persisted, and the user can recover through
/// [`resend_activation`](Self::resend_activation) or a new reset request.
pub struct CredentialManager<R, N> {
    repository: R,
    notifier: N,
    hasher: PasswordHasher,
    tokens: TokenGenerator,
    clock: Arc<dyn Clock>,
    settings: ManagerSettings,
    reset_token_ttl: Duration,
    // Verified against when the email is unknown, so both login failures cost the same
    decoy: HashedPassword,
}

impl<R: UserRepository, N: Notifier> CredentialManager<R, N> {
    /// Fails when `settings` carries a reset lifetime or work factor out of range
    pub fn new(
        repository: R,
        notifier: N,
        settings: ManagerSettings,
    ) -> Result<Self, ConfigError> {
        let reset_token_ttl = reset_token_ttl(settings.reset_token_ttl_hours)?;
        if settings.hash_iterations == 0 {
            return Err(ConfigError::Invalid(
                "hash_iterations must be positive".to_string(),
            ));
        }

        let hasher = PasswordHasher::new(settings.hash_iterations);
        let decoy = hasher.hash("decoy-password");
        Ok(Self {
            repository,
            notifier,
            hasher,
            tokens: TokenGenerator::new(),
            clock: Arc::new(SystemClock),
            settings,
            reset_token_ttl,
            decoy,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Create an inactive account and mail its activation link
    pub fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if self.repository.find_by_email(&email)?.is_some() {
            log_auth_event("register", &email, false, Some("email already registered"));
            return Err(AuthError::AlreadyExists);
        }

        let activation_token = self.tokens.new_token();
        let user = User::new(
            &email,
            self.hasher.hash(password),
            activation_token.clone(),
            self.clock.now(),
        );
        let user = self.repository.add(user).map_err(|e| match e {
            StoreError::DuplicateEmail => AuthError::AlreadyExists,
            other => AuthError::Storage(other),
        })?;
        log_auth_event("register", &email, true, None);

        let link = build_link(&self.settings.activation_base_url, &activation_token);
        self.report_delivery(
            "activation",
            &email,
            self.notifier.send_activation_email(&email, &link),
        );
        Ok(user)
    }

    /// Check a password. Activation state is not consulted.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.repository.find_by_email(email)? {
            Some(user) => user,
            None => {
                let _ = self
                    .hasher
                    .verify(password, &self.decoy.salt, &self.decoy.hash);
                log_auth_event("login", email, false, Some("unknown email"));
                return Err(AuthError::NotFound);
            }
        };

        if !self
            .hasher
            .verify(password, user.salt(), user.password_hash())
        {
            log_auth_event("login", &user.email, false, Some("incorrect password"));
            return Err(AuthError::InvalidCredentials);
        }

        if user.state() == AccountState::PendingActivation {
            debug!("User {} logged in before activating", user.id);
        }
        log_auth_event("login", &user.email, true, None);
        Ok(user)
    }

    /// Issue a reset token, replacing any outstanding one, and mail the link
    pub fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let mut user = self.user_by_email(email)?;

        let token = self.tokens.new_token();
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(self.reset_token_ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        user.reset_token = Some(ResetToken {
            token: token.clone(),
            expires_at,
        });
        self.repository.update(&user)?;
        log_auth_event("request_reset", &user.email, true, None);

        let link = build_link(&self.settings.reset_base_url, &token);
        self.report_delivery(
            "password reset",
            &user.email,
            self.notifier.send_password_reset_email(&user.email, &link),
        );
        Ok(())
    }

    /// Consume a live reset token and store a freshly salted hash of `new_password`
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let mut user = match self.repository.find_by_reset_token(token)? {
            Some(user) => user,
            None => {
                debug!("Reset attempted with unknown token");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };

        let now = self.clock.now();
        let live = user
            .reset_token
            .as_ref()
            .is_some_and(|reset| reset.is_valid_at(now));
        if !live {
            log_auth_event("reset_password", &user.email, false, Some("token expired"));
            return Err(AuthError::InvalidOrExpiredToken);
        }

        user.set_password(self.hasher.hash(new_password));
        user.reset_token = None;
        self.repository.update(&user).map_err(|e| match e {
            StoreError::Conflict => AuthError::InvalidOrExpiredToken,
            other => AuthError::Storage(other),
        })?;

        log_auth_event("reset_password", &user.email, true, None);
        Ok(())
    }

    /// Activate the account holding `token`. A second call with the same token fails.
    pub fn activate_user(&self, token: &str) -> Result<User, AuthError> {
        let mut user = match self.repository.find_by_activation_token(token)? {
            Some(user) => user,
            None => {
                debug!("Activation attempted with unknown token");
                return Err(AuthError::InvalidToken);
            }
        };

        user.is_active = true;
        user.activation_token = None;
        self.repository.update(&user).map_err(|e| match e {
            StoreError::Conflict => AuthError::InvalidToken,
            other => AuthError::Storage(other),
        })?;

        log_auth_event("activate", &user.email, true, None);
        Ok(user)
    }

    pub fn user_by_email(&self, email: &str) -> Result<User, AuthError> {
        self.repository
            .find_by_email(email)?
            .ok_or(AuthError::NotFound)
    }

    /// Replace the activation token of a still-inactive account and mail it again
    pub fn resend_activation(&self, email: &str) -> Result<(), AuthError> {
        let mut user = self.user_by_email(email)?;
        if user.state() != AccountState::PendingActivation {
            log_auth_event("resend_activation", &user.email, false, Some("already active"));
            return Err(AuthError::InvalidToken);
        }

        let token = self.tokens.new_token();
        user.activation_token = Some(token.clone());
        self.repository.update(&user).map_err(|e| match e {
            StoreError::Conflict => AuthError::InvalidToken,
            other => AuthError::Storage(other),
        })?;
        log_auth_event("resend_activation", &user.email, true, None);

        let link = build_link(&self.settings.activation_base_url, &token);
        self.report_delivery(
            "activation",
            &user.email,
            self.notifier.send_activation_email(&user.email, &link),
        );
        Ok(())
    }

    fn report_delivery(&self, kind: &str, email: &str, result: Result<(), EmailError>) {
        if let Err(e) = result {
            error!(
                "Failed to deliver {} email to {}: {}",
                kind,
                format_sensitive(email),
                e
            );
        }
    }
}
