pub mod console;
pub mod manager;
mod setup;
pub mod smtp;
pub mod templates;

pub use console::ConsoleNotifier;
pub use manager::SecureEmailManager;
pub use setup::setup_email_credentials;
pub use smtp::{SmtpCredentials, SmtpNotifier};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP credentials unavailable: {0}")]
    Credentials(String),
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Delivers activation and reset links to an address.
///
/// The credential manager logs a failed delivery but never rolls back the
/// state change that produced the link.
pub trait Notifier: Send + Sync {
    fn send_activation_email(&self, email: &str, activation_link: &str) -> Result<(), EmailError>;
    fn send_password_reset_email(&self, email: &str, reset_link: &str) -> Result<(), EmailError>;
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn send_activation_email(&self, email: &str, activation_link: &str) -> Result<(), EmailError> {
        (**self).send_activation_email(email, activation_link)
    }

    fn send_password_reset_email(&self, email: &str, reset_link: &str) -> Result<(), EmailError> {
        (**self).send_password_reset_email(email, reset_link)
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn send_activation_email(&self, email: &str, activation_link: &str) -> Result<(), EmailError> {
        (**self).send_activation_email(email, activation_link)
    }

    fn send_password_reset_email(&self, email: &str, reset_link: &str) -> Result<(), EmailError> {
        (**self).send_password_reset_email(email, reset_link)
    }
}

/// Build a `<base-url>?token=<token>` link
pub fn build_link(base_url: &str, token: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", base_url, separator, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_link() {
        assert_eq!(
            build_link("https://yourapp.com/activate", "abc"),
            "https://yourapp.com/activate?token=abc"
        );
        assert_eq!(
            build_link("https://yourapp.com/reset?lang=en", "abc"),
            "https://yourapp.com/reset?lang=en&token=abc"
        );
    }
}
