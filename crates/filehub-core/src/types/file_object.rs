//! Storage-level entry returned to the protocol adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content_type::{DIRECTORY_CONTENT_TYPE, content_type_for};
use super::path;

/// A file or directory inside a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    /// Last path element.
    pub name: String,
    /// Cleaned, repository-relative path starting with `/`.
    pub path: String,
    /// Whether this entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification instant.
    pub modified: DateTime<Utc>,
    /// MIME type, or `httpd/unix-directory`.
    pub content_type: String,
}

impl FileObject {
    /// Build a file entry; the name and content type derive from the path.
    pub fn file(file_path: &str, size: u64, modified: DateTime<Utc>) -> Self {
        let cleaned = path::clean_rooted(file_path);
        Self {
            name: path::basename(&cleaned),
            content_type: content_type_for(&cleaned).to_string(),
            path: cleaned,
            is_dir: false,
            size,
            modified,
        }
    }

    /// Build a directory entry.
    pub fn directory(dir_path: &str, modified: DateTime<Utc>) -> Self {
        let cleaned = path::clean_rooted(dir_path);
        Self {
            name: path::basename(&cleaned),
            path: cleaned,
            is_dir: true,
            size: 0,
            modified,
            content_type: DIRECTORY_CONTENT_TYPE.to_string(),
        }
    }
}
