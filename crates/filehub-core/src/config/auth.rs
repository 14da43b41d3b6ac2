//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Realm, session and nonce settings.
///
/// The realm is baked into every stored HA1, so changing it invalidates
/// all existing credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Realm used in challenges and in the HA1 pre-hash.
    #[serde(default = "default_realm")]
    pub realm: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Digest nonce replay window in seconds.
    #[serde(default = "default_nonce_ttl")]
    pub nonce_ttl_secs: u64,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            realm: default_realm(),
            session_ttl_secs: default_session_ttl(),
            nonce_ttl_secs: default_nonce_ttl(),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_realm() -> String {
    "FileHub".to_string()
}

fn default_session_ttl() -> u64 {
    86_400
}

fn default_nonce_ttl() -> u64 {
    300
}

fn default_cookie_name() -> String {
    "filehub_session".to_string()
}
