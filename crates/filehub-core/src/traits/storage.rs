//! Storage capability shared by every backend.
//!
//! Every operation is keyed by a `(repo, path)` pair. `repo` is the
//! repository name used as a namespace segment inside the backend root;
//! `path` is repository-relative and is cleaned by the implementation
//! before it touches the backing store.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;
use crate::types::content_type_for;
use crate::types::file_object::FileObject;

/// A byte stream type used for reading and writing file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Returned by a [`StorageProvider::scan`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// Keep walking.
    Continue,
    /// Stop the scan after this entry.
    Stop,
}

/// File-like operations against one backing store.
///
/// Copy and move only work within a single repository; callers detect
/// cross-repository requests before reaching the backend.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Write a stream to `path`, creating parent directories. Returns the
    /// number of bytes written.
    async fn put_file(&self, repo: &str, path: &str, body: ByteStream) -> AppResult<u64>;

    /// Open `path` for reading. Dropping the stream releases the handle.
    async fn open_file(&self, repo: &str, path: &str) -> AppResult<ByteStream>;

    /// Remove a file or directory tree.
    async fn delete_file(&self, repo: &str, path: &str) -> AppResult<()>;

    /// Copy a file or directory tree within the repository.
    async fn copy_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()>;

    /// Move a file or directory tree within the repository.
    async fn move_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()>;

    /// Describe a single entry.
    async fn get_info(&self, repo: &str, path: &str) -> AppResult<FileObject>;

    /// Direct children of a directory.
    async fn list_dir(&self, repo: &str, path: &str) -> AppResult<Vec<FileObject>>;

    /// Create a directory and any missing parents.
    async fn create_dir(&self, repo: &str, path: &str) -> AppResult<()>;

    /// Walk every entry in the repository, calling `visit` once per entry
    /// until it returns [`ScanControl::Stop`].
    async fn scan(
        &self,
        repo: &str,
        visit: &mut (dyn FnMut(FileObject) -> ScanControl + Send),
    ) -> AppResult<()>;

    /// Content type for `path`, resolved from its extension.
    fn content_type(&self, _repo: &str, path: &str) -> String {
        content_type_for(path).to_string()
    }
}
