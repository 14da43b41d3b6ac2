//! Backend selection by repository URI scheme.

use std::path::PathBuf;

use async_trait::async_trait;

use filehub_core::config::storage::S3Config;
use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, ScanControl, StorageProvider};
use filehub_core::types::FileObject;
use filehub_entity::repository::RepositoryUri;

use crate::providers::LocalStorageProvider;
#[cfg(feature = "s3")]
use crate::providers::S3StorageProvider;

/// One concrete backend. Dispatch is a plain `match`, decided once when the
/// repository is opened.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Local filesystem.
    Local(LocalStorageProvider),
    /// S3-compatible object store.
    #[cfg(feature = "s3")]
    S3(S3StorageProvider),
}

impl StorageBackend {
    /// Build the backend a root URI asks for.
    pub async fn from_uri(
        uri: &RepositoryUri,
        root_dirs: &[PathBuf],
        s3: Option<&S3Config>,
    ) -> AppResult<Self> {
        match uri {
            RepositoryUri::Local { root } => Ok(Self::Local(
                LocalStorageProvider::new(root.clone(), root_dirs).await?,
            )),
            #[cfg(feature = "s3")]
            RepositoryUri::S3 { bucket, prefix } => {
                let config = s3.ok_or_else(|| {
                    AppError::configuration(format!(
                        "Repository root '{uri}' needs an s3 configuration block"
                    ))
                })?;
                Ok(Self::S3(S3StorageProvider::new(config, bucket, prefix)))
            }
            #[cfg(not(feature = "s3"))]
            RepositoryUri::S3 { .. } => {
                let _ = s3;
                Err(AppError::configuration(format!(
                    "Repository root '{uri}' needs the `s3` feature"
                )))
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $provider:ident => $call:expr) => {
        match $self {
            StorageBackend::Local($provider) => $call,
            #[cfg(feature = "s3")]
            StorageBackend::S3($provider) => $call,
        }
    };
}

#[async_trait]
impl StorageProvider for StorageBackend {
    fn provider_type(&self) -> &str {
        dispatch!(self, p => p.provider_type())
    }

    async fn put_file(&self, repo: &str, path: &str, body: ByteStream) -> AppResult<u64> {
        dispatch!(self, p => p.put_file(repo, path, body).await)
    }

    async fn open_file(&self, repo: &str, path: &str) -> AppResult<ByteStream> {
        dispatch!(self, p => p.open_file(repo, path).await)
    }

    async fn delete_file(&self, repo: &str, path: &str) -> AppResult<()> {
        dispatch!(self, p => p.delete_file(repo, path).await)
    }

    async fn copy_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        dispatch!(self, p => p.copy_file(repo, src, dst).await)
    }

    async fn move_file(&self, repo: &str, src: &str, dst: &str) -> AppResult<()> {
        dispatch!(self, p => p.move_file(repo, src, dst).await)
    }

    async fn get_info(&self, repo: &str, path: &str) -> AppResult<FileObject> {
        dispatch!(self, p => p.get_info(repo, path).await)
    }

    async fn list_dir(&self, repo: &str, path: &str) -> AppResult<Vec<FileObject>> {
        dispatch!(self, p => p.list_dir(repo, path).await)
    }

    async fn create_dir(&self, repo: &str, path: &str) -> AppResult<()> {
        dispatch!(self, p => p.create_dir(repo, path).await)
    }

    async fn scan(
        &self,
        repo: &str,
        visit: &mut (dyn FnMut(FileObject) -> ScanControl + Send),
    ) -> AppResult<()> {
        dispatch!(self, p => p.scan(repo, visit).await)
    }
}
