use base64::{engine::general_purpose::STANDARD as base64, Engine as _};
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::HmacSha256;

/// Salt byte length before base64 encoding
pub const SALT_BYTES: usize = 16;

/// Derived key length in bytes
const DIGEST_BYTES: usize = 32;

/// Default PBKDF2 work factor
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Output of [`PasswordHasher::hash`]. The two halves are only ever stored together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

/// Salted PBKDF2-HMAC-SHA256 password hashing.
///
/// Stored hashes look like `"<iterations>$<hex digest>"`, so verification
/// keeps working after the configured work factor changes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash a password under a freshly generated salt
    pub fn hash(&self, password: &str) -> HashedPassword {
        let salt = generate_salt();
        let digest = derive(password, &salt, self.iterations);
        HashedPassword {
            hash: format!("{}${}", self.iterations, hex::encode(digest)),
            salt,
        }
    }

    /// Recompute the digest for `password` under `salt` and compare it with `hash`.
    ///
    /// Malformed input simply fails to verify.
    pub fn verify(&self, password: &str, salt: &str, hash: &str) -> bool {
        let (iterations, expected) = match parse_stored_hash(hash) {
            Some(parts) => parts,
            None => return false,
        };
        let actual = derive(password, salt, iterations);
        constant_time_eq(&actual, &expected)
    }
}

/// Generate a random salt for PBKDF2, base64 encoded
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base64.encode(bytes)
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; DIGEST_BYTES] {
    let mut key = [0u8; DIGEST_BYTES];
    pbkdf2::<HmacSha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}

fn parse_stored_hash(hash: &str) -> Option<(u32, Vec<u8>)> {
    let (iterations, digest) = hash.split_once('$')?;
    let iterations: u32 = iterations.parse().ok()?;
    if iterations == 0 {
        return None;
    }
    let digest = hex::decode(digest).ok()?;
    if digest.len() != DIGEST_BYTES {
        return None;
    }
    Some((iterations, digest))
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
