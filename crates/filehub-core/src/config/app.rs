//! HTTP listener configuration.

use serde::{Deserialize, Serialize};

/// The `web` section: one listener serves both the WebDAV and JSON surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Verbose logging and debug response details.
    #[serde(default)]
    pub debug: bool,
    /// Whether metrics collection was requested.
    #[serde(default)]
    pub metrics: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            metrics: false,
        }
    }
}

impl WebConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}
