use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::modules::auth::password::DEFAULT_ITERATIONS;

/// Longest lifetime a reset token may be configured with (one year)
pub const MAX_RESET_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the credential manager and the CLI around it.
///
/// SMTP credentials are deliberately absent; they live in the OS keyring.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Base of the link mailed after registration
    pub activation_base_url: String,
    /// Base of the link mailed after a reset request
    pub reset_base_url: String,
    pub reset_token_ttl_hours: i64,
    /// PBKDF2 iterations for newly hashed passwords
    pub hash_iterations: u32,
    pub users_file: PathBuf,
    pub log_file: PathBuf,
    /// Display name used in the From header and email signatures
    pub sender_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            activation_base_url: "https://yourapp.com/activate".to_string(),
            reset_base_url: "https://yourapp.com/reset-password".to_string(),
            reset_token_ttl_hours: 24,
            hash_iterations: DEFAULT_ITERATIONS,
            users_file: PathBuf::from(crate::USERS_FILE),
            log_file: PathBuf::from("application.log"),
            sender_name: "Secure Auth".to_string(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from `path`, falling back to defaults if it is missing
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        reset_token_ttl(self.reset_token_ttl_hours)?;
        if self.hash_iterations == 0 {
            return Err(ConfigError::Invalid(
                "hash_iterations must be positive".to_string(),
            ));
        }
        if self.activation_base_url.is_empty() || self.reset_base_url.is_empty() {
            return Err(ConfigError::Invalid("link base URLs must be set".to_string()));
        }
        if self.activation_base_url == self.reset_base_url {
            return Err(ConfigError::Invalid(
                "activation and reset links need distinct base URLs".to_string(),
            ));
        }
        Ok(())
    }
}

/// Turn a configured reset lifetime into a `Duration`, rejecting values
/// outside `1..=MAX_RESET_TOKEN_TTL_HOURS`
pub fn reset_token_ttl(hours: i64) -> Result<Duration, ConfigError> {
    if !(1..=MAX_RESET_TOKEN_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::Invalid(format!(
            "reset_token_ttl_hours must be between 1 and {}, got {}",
            MAX_RESET_TOKEN_TTL_HOURS, hours
        )));
    }
    Ok(Duration::hours(hours))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AuthConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AuthConfig::default());
        assert_eq!(config.reset_token_ttl_hours, 24);
        assert_eq!(config.hash_iterations, 100_000);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "activation_base_url": "https://auth.example.org/activate" }"#)
            .unwrap();

        let config = AuthConfig::load(&path).unwrap();
        assert_eq!(config.activation_base_url, "https://auth.example.org/activate");
        assert_eq!(config.reset_base_url, "https://yourapp.com/reset-password");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = AuthConfig {
            reset_token_ttl_hours: 2,
            sender_name: "Example".to_string(),
            ..AuthConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AuthConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{ "reset_token_ttl_hours": 0 }"#).unwrap();
        assert!(matches!(AuthConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, r#"{ "reset_token_ttl_hours": -5 }"#).unwrap();
        assert!(matches!(AuthConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(AuthConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_reset_ttl_has_upper_bound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "reset_token_ttl_hours": 100000000000 }"#).unwrap();
        assert!(matches!(AuthConfig::load(&path), Err(ConfigError::Invalid(_))));

        assert_eq!(
            reset_token_ttl(MAX_RESET_TOKEN_TTL_HOURS).unwrap(),
            Duration::hours(MAX_RESET_TOKEN_TTL_HOURS)
        );
        assert!(reset_token_ttl(MAX_RESET_TOKEN_TTL_HOURS + 1).is_err());
        assert!(reset_token_ttl(0).is_err());
    }
}
