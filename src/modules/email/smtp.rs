use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::templates::{self, EmailContent};
use super::{EmailError, Notifier};
use crate::modules::utils::logging::format_sensitive;

/// Structure to hold SMTP credentials with metadata
#[derive(Serialize, Deserialize, Clone)]
pub struct SmtpCredentials {
    // The email address/username for SMTP authentication
    pub username: String,
    // The password or app-specific password for SMTP
    pub password: String,
    // SMTP server hostname (e.g., smtp.gmail.com)
    pub host: String,
    // SMTP server port (typically 587 for TLS)
    pub port: u16,
    // When these credentials were last updated
    pub last_updated: u64,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("last_updated", &self.last_updated)
            .finish()
    }
}

/// Sends activation and reset emails over authenticated, TLS-only SMTP
pub struct SmtpNotifier {
    credentials: SmtpCredentials,
    sender_name: String,
    reset_valid_hours: i64,
}

impl SmtpNotifier {
    pub fn new(credentials: SmtpCredentials, sender_name: &str, reset_valid_hours: i64) -> Self {
        Self {
            credentials,
            sender_name: sender_name.to_string(),
            reset_valid_hours,
        }
    }

    fn build_message(&self, to_email: &str, content: &EmailContent) -> Result<Message, EmailError> {
        Message::builder()
            .from(
                format!("{} <{}>", self.sender_name, self.credentials.username)
                    .parse()
                    .map_err(|e| EmailError::Address(format!("from: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::Address(format!("to: {}", e)))?)
            .subject(content.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(content.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    fn send(&self, to_email: &str, content: &EmailContent) -> Result<(), EmailError> {
        let message = self.build_message(to_email, content)?;

        let tls_parameters = TlsParameters::builder(self.credentials.host.clone())
            .build()
            .map_err(|e| EmailError::Transport(format!("TLS parameters: {}", e)))?;

        let mailer = SmtpTransport::relay(&self.credentials.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(Credentials::new(
                self.credentials.username.clone(),
                self.credentials.password.clone(),
            ))
            .port(self.credentials.port)
            .tls(Tls::Required(tls_parameters))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        match mailer.send(&message) {
            Ok(_) => {
                info!("Email sent to {}", format_sensitive(to_email));
                Ok(())
            }
            Err(e) => {
                error!("SMTP delivery to {} failed: {}", format_sensitive(to_email), e);
                Err(EmailError::Transport(e.to_string()))
            }
        }
    }
}

impl Notifier for SmtpNotifier {
    fn send_activation_email(&self, email: &str, activation_link: &str) -> Result<(), EmailError> {
        let content = templates::activation_email(&self.sender_name, activation_link);
        self.send(email, &content)
    }

    fn send_password_reset_email(&self, email: &str, reset_link: &str) -> Result<(), EmailError> {
        let content =
            templates::password_reset_email(&self.sender_name, reset_link, self.reset_valid_hours);
        self.send(email, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> SmtpNotifier {
        SmtpNotifier::new(
            SmtpCredentials {
                username: "sender@example.com".to_string(),
                password: "app-password".to_string(),
                host: "smtp.example.com".to_string(),
                port: 587,
                last_updated: 0,
            },
            "Secure Auth",
            24,
        )
    }

    #[test]
    fn test_message_builds_for_valid_addresses() {
        let content = templates::activation_email("Secure Auth", "https://yourapp.com/activate?token=abc");
        assert!(notifier().build_message("user@example.com", &content).is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_rejected() {
        let content = templates::activation_email("Secure Auth", "link");
        let result = notifier().build_message("not an address", &content);
        assert!(matches!(result, Err(EmailError::Address(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", notifier().credentials);
        assert!(!rendered.contains("app-password"));
        assert!(rendered.contains("<redacted>"));
    }
}
