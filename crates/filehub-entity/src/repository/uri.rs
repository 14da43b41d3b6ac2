//! Repository root URIs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use filehub_core::error::AppError;

/// Where a repository's backend lives, chosen by URI scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepositoryUri {
    /// `file:///absolute/dir`
    Local {
        /// Absolute directory holding repository namespaces.
        root: PathBuf,
    },
    /// `s3://bucket/prefix`
    S3 {
        /// Bucket name.
        bucket: String,
        /// Key prefix without leading or trailing slashes (may be empty).
        prefix: String,
    },
}

impl FromStr for RepositoryUri {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("file://") {
            let root = PathBuf::from(rest);
            if !root.is_absolute() {
                return Err(AppError::configuration(format!(
                    "Repository root '{s}' must be an absolute file:// URI"
                )));
            }
            return Ok(Self::Local { root });
        }

        if let Some(rest) = s.strip_prefix("s3://") {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(AppError::configuration(format!(
                    "Repository root '{s}' is missing a bucket"
                )));
            }
            return Ok(Self::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            });
        }

        Err(AppError::configuration(format!(
            "Unsupported repository root scheme in '{s}'"
        )))
    }
}

impl fmt::Display for RepositoryUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { root } => write!(f, "file://{}", root.display()),
            Self::S3 { bucket, prefix } if prefix.is_empty() => write!(f, "s3://{bucket}"),
            Self::S3 { bucket, prefix } => write!(f, "s3://{bucket}/{prefix}"),
        }
    }
}
