//! `Authorization: Basic` decoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Credentials carried by a Basic header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// Username.
    pub username: String,
    /// Password (plaintext from the header).
    pub password: String,
}

/// Why a Basic payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BasicError {
    /// Base64 or UTF-8 decoding failed.
    #[error("Invalid base64 encoding")]
    InvalidEncoding,
    /// The decoded value has no `:` separator.
    #[error("Invalid credentials format")]
    InvalidFormat,
}

/// Decodes the part of a Basic header after the scheme name.
pub fn decode_basic(encoded: &str) -> Result<BasicCredentials, BasicError> {
    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| BasicError::InvalidEncoding)?;
    let decoded = String::from_utf8(decoded).map_err(|_| BasicError::InvalidEncoding)?;

    let (username, password) = decoded.split_once(':').ok_or(BasicError::InvalidFormat)?;

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
