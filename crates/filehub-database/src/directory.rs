//! Directory traits consulted by the authentication and storage layers.
//!
//! The server only needs key-value style lookups, so the traits stay
//! narrow enough to be backed by Postgres in production and by plain
//! maps in tests.

use async_trait::async_trait;
use uuid::Uuid;

use filehub_core::result::AppResult;
use filehub_entity::repository::{CreateRepository, Repository};
use filehub_entity::user::{CreateUser, User};

/// Lookup and bookkeeping for user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by username (case-insensitive).
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Number of registered users.
    async fn count(&self) -> AppResult<i64>;

    /// All users ordered by username.
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Insert a user. Fails with a conflict when the username is taken.
    async fn create(&self, input: CreateUser) -> AppResult<User>;

    /// Stamp the last successful login.
    async fn update_last_login(&self, id: Uuid) -> AppResult<()>;

    /// Replace the stored HA1.
    async fn update_ha1(&self, id: Uuid, ha1: &str) -> AppResult<()>;

    /// Add `delta` (possibly negative) to the quota counter, never going
    /// below zero.
    async fn adjust_used_bytes(&self, id: Uuid, delta: i64) -> AppResult<()>;
}

/// Lookup for repositories.
#[async_trait]
pub trait RepositoryDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// The owner's home repository: the first one created for them.
    async fn find_home(&self, owner_id: Uuid) -> AppResult<Option<Repository>>;

    /// Find a repository by its unique name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Repository>>;

    /// Every repository owned by a user, oldest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Repository>>;

    /// Insert a repository. Fails with a conflict when the name is taken.
    async fn create(&self, input: CreateRepository) -> AppResult<Repository>;
}
