//! Shared application state passed to every handler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use filehub_auth::{Authenticator, CredentialStore, NonceStore, PasswordHasher, SessionStore};
use filehub_core::config::AppConfig;
use filehub_database::directory::{RepositoryDirectory, UserDirectory};
use filehub_storage::StorageManager;
use filehub_webdav::DavHandler;

/// Application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// User directory (quota counter, profile reads).
    pub users: Arc<dyn UserDirectory>,
    /// Repository directory.
    pub repositories: Arc<dyn RepositoryDirectory>,
    /// Cached credential lookups.
    pub credentials: Arc<CredentialStore>,
    /// Cookie sessions.
    pub sessions: Arc<SessionStore>,
    /// Per-request authentication pipeline.
    pub authenticator: Arc<Authenticator>,
    /// Repository → backend resolution.
    pub storage: StorageManager,
    /// WebDAV adapter.
    pub dav: Arc<DavHandler>,
    /// Serialises first-run setup.
    pub setup_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Wire the stores together. Starts the session reaper, so it must
    /// run inside a Tokio runtime.
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserDirectory>,
        repositories: Arc<dyn RepositoryDirectory>,
    ) -> Self {
        let credentials = Arc::new(CredentialStore::new(
            Arc::clone(&users),
            PasswordHasher::new(config.auth.realm.clone()),
        ));
        let sessions = SessionStore::new(Duration::from_secs(config.auth.session_ttl_secs));
        let nonces = NonceStore::new(Duration::from_secs(config.auth.nonce_ttl_secs));
        let authenticator = Arc::new(Authenticator::new(
            Arc::clone(&credentials),
            Arc::clone(&sessions),
            nonces,
            config.auth.cookie_name.clone(),
        ));

        let storage = StorageManager::new(config.root_dir.clone(), config.s3.clone());
        let dav = Arc::new(DavHandler::new(
            storage.clone(),
            Arc::clone(&repositories),
            Arc::clone(&users),
        ));

        Self {
            config: Arc::new(config),
            users,
            repositories,
            credentials,
            sessions,
            authenticator,
            storage,
            dav,
            setup_lock: Arc::new(Mutex::new(())),
        }
    }
}
