//! Storage manager: resolves a repository to its backend.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use filehub_core::config::storage::S3Config;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::StorageProvider;
use filehub_entity::repository::{Repository, RepositoryUri};

use crate::backend::StorageBackend;

/// Builds backends lazily, one per distinct root URI, and shares them
/// between repositories with the same root.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Root URI → backend instance.
    backends: Arc<RwLock<HashMap<RepositoryUri, Arc<StorageBackend>>>>,
    /// Repositories whose root directory has been created.
    prepared: Arc<RwLock<HashSet<Uuid>>>,
    /// Whitelist for local roots.
    root_dirs: Arc<Vec<PathBuf>>,
    /// Credentials for `s3://` roots.
    s3: Option<Arc<S3Config>>,
}

impl StorageManager {
    /// Create a manager with the configured local whitelist and S3 block.
    pub fn new(root_dirs: Vec<PathBuf>, s3: Option<S3Config>) -> Self {
        Self {
            backends: Arc::new(RwLock::new(HashMap::new())),
            prepared: Arc::new(RwLock::new(HashSet::new())),
            root_dirs: Arc::new(root_dirs),
            s3: s3.map(Arc::new),
        }
    }

    /// Backend for `repo`, creating the repository root on first use.
    pub async fn open(&self, repo: &Repository) -> AppResult<Arc<StorageBackend>> {
        let uri = repo.uri()?;
        let backend = self.backend_for(&uri).await?;

        if !self.prepared.read().await.contains(&repo.id) {
            backend.create_dir(&repo.name, "/").await?;
            self.prepared.write().await.insert(repo.id);
            tracing::info!(
                repository = %repo.name,
                root = %uri,
                provider = backend.provider_type(),
                "Opened repository"
            );
        }
        Ok(backend)
    }

    async fn backend_for(&self, uri: &RepositoryUri) -> AppResult<Arc<StorageBackend>> {
        if let Some(backend) = self.backends.read().await.get(uri) {
            return Ok(backend.clone());
        }

        let built = Arc::new(
            StorageBackend::from_uri(uri, &self.root_dirs, self.s3.as_deref()).await?,
        );
        let mut backends = self.backends.write().await;
        Ok(backends.entry(uri.clone()).or_insert(built).clone())
    }

    /// Number of distinct backends built so far.
    pub async fn backend_count(&self) -> usize {
        self.backends.read().await.len()
    }
}
