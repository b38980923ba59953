use chrono::Utc;
use keyring::Entry;

use super::smtp::SmtpCredentials;
use super::EmailError;

const KEYRING_SERVICE: &str = "secure-auth-email";
const KEYRING_ACCOUNT: &str = "smtp-credentials";

/// Keeps SMTP credentials in the OS keyring rather than the config file
pub struct SecureEmailManager {
    keyring: Entry,
}

impl SecureEmailManager {
    pub fn new() -> Result<Self, EmailError> {
        let keyring = Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT)
            .map_err(|e| EmailError::Credentials(format!("keyring unavailable: {}", e)))?;
        Ok(Self { keyring })
    }

    // Store new SMTP credentials in the system keyring
    pub fn store_credentials(
        &self,
        username: &str,
        password: &str,
        host: &str,
        port: u16,
    ) -> Result<(), EmailError> {
        let credentials = SmtpCredentials {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            last_updated: Utc::now().timestamp().max(0) as u64,
        };

        let creds_json = serde_json::to_string(&credentials)
            .map_err(|e| EmailError::Credentials(format!("failed to serialize: {}", e)))?;

        self.keyring
            .set_password(&creds_json)
            .map_err(|e| EmailError::Credentials(format!("failed to store: {}", e)))
    }

    // Retrieve stored SMTP credentials from the system keyring
    pub fn get_credentials(&self) -> Result<SmtpCredentials, EmailError> {
        let creds_json = self
            .keyring
            .get_password()
            .map_err(|e| EmailError::Credentials(format!("failed to retrieve: {}", e)))?;

        parse_credentials(&creds_json)
    }

    pub fn delete_credentials(&self) -> Result<(), EmailError> {
        self.keyring
            .delete_password()
            .map_err(|e| EmailError::Credentials(format!("failed to delete: {}", e)))
    }
}

fn parse_credentials(creds_json: &str) -> Result<SmtpCredentials, EmailError> {
    serde_json::from_str(creds_json)
        .map_err(|e| EmailError::Credentials(format!("failed to parse: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stored_credentials() {
        let json = r#"{
            "username": "sender@example.com",
            "password": "app-password",
            "host": "smtp.example.com",
            "port": 587,
            "last_updated": 1700000000
        }"#;
        let creds = parse_credentials(json).unwrap();
        assert_eq!(creds.username, "sender@example.com");
        assert_eq!(creds.host, "smtp.example.com");
        assert_eq!(creds.port, 587);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_credentials("not json"),
            Err(EmailError::Credentials(_))
        ));
    }
}
