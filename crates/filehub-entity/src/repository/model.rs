//! Repository entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;

use super::uri::RepositoryUri;

/// A named, rooted namespace for a user's files.
///
/// Created out-of-band and never mutated while the server runs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Repository {
    /// Unique repository identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Display name, also the namespace segment inside the backend root.
    pub name: String,
    /// Backend root: `file:///abs/dir` or `s3://bucket/prefix`.
    pub root_uri: String,
    /// When the repository was created.
    pub created_at: DateTime<Utc>,
}

impl Repository {
    /// Parse the root URI.
    pub fn uri(&self) -> AppResult<RepositoryUri> {
        self.root_uri.parse()
    }

    /// Check that a name can be used as a single path segment.
    pub fn validate_name(name: &str) -> AppResult<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(AppError::validation(format!(
                "Invalid repository name '{name}'"
            )));
        }
        Ok(())
    }
}

/// Data required to create a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepository {
    /// Owning user.
    pub owner_id: Uuid,
    /// Repository name.
    pub name: String,
    /// Backend root URI.
    pub root_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(Repository::validate_name("alice").is_ok());
        assert!(Repository::validate_name("").is_err());
        assert!(Repository::validate_name("..").is_err());
        assert!(Repository::validate_name("a/b").is_err());
    }
}
