//! Object-store configuration.

use serde::{Deserialize, Serialize};

/// The optional `s3` section. Required only when a repository is rooted
/// at an `s3://` URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Endpoint URL (for non-AWS services like MinIO).
    pub endpoint: String,
    /// Region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}
