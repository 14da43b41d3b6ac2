//! HA1 computation and verification.
//!
//! Digest authentication needs the password in the fixed pre-hashed form
//! `MD5(username:realm:password)`, so that is what gets stored. The realm
//! is part of every hash: changing it invalidates all credentials.

use subtle::ConstantTimeEq;

use filehub_core::error::AppError;

/// Hex-encoded MD5 of `input`.
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Compare two strings without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Computes and verifies HA1 values for a fixed realm.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    realm: String,
}

impl PasswordHasher {
    /// Creates a hasher bound to `realm`.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
        }
    }

    /// The realm baked into every hash.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Computes `MD5(username:realm:password)` as lowercase hex.
    pub fn hash_password(&self, username: &str, password: &str) -> Result<String, AppError> {
        if username.contains(':') {
            return Err(AppError::validation("Username must not contain ':'"));
        }
        Ok(md5_hex(&format!("{username}:{}:{password}", self.realm)))
    }

    /// Verifies a plaintext password against a stored HA1.
    pub fn verify_password(&self, username: &str, password: &str, ha1: &str) -> bool {
        match self.hash_password(username, password) {
            Ok(candidate) => constant_time_eq(&candidate, &ha1.to_ascii_lowercase()),
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new("FileHub")
    }
}
