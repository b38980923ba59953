use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Random bytes behind every token
pub const TOKEN_BYTES: usize = 64;

/// Outstanding password reset: the token and its expiry travel together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        is_token_valid(Some(self.expires_at), now)
    }
}

/// Produces opaque, URL-safe activation and reset tokens
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn new_token(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// A token is live only while its expiry lies strictly in the future
pub fn is_token_valid(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(expiry) if expiry > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    #[test]
    fn test_token_length_and_alphabet() {
        let token = TokenGenerator::new().new_token();
        // 64 bytes -> 86 base64 characters without padding
        assert_eq!(token.len(), 86);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_do_not_repeat() {
        let generator = TokenGenerator::new();
        let tokens: HashSet<String> = (0..1_000).map(|_| generator.new_token()).collect();
        assert_eq!(tokens.len(), 1_000);
    }

    #[test]
    fn test_is_token_valid() {
        let now = Utc::now();
        assert!(is_token_valid(Some(now + Duration::hours(1)), now));
        assert!(!is_token_valid(Some(now - Duration::hours(1)), now));
        assert!(!is_token_valid(None, now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let reset = ResetToken {
            token: "t".to_string(),
            expires_at: now,
        };
        assert!(!reset.is_valid_at(now));
        assert!(reset.is_valid_at(now - Duration::seconds(1)));
    }
}
