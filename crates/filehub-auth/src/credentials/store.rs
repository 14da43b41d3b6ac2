//! Cached credential store.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_database::directory::UserDirectory;
use filehub_entity::repository::Repository;
use filehub_entity::user::{CreateUser, User};

use crate::password::PasswordHasher;

/// Message returned for every failed login, whether or not the user exists.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// How long a looked-up user stays cached.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Upper bound on cached users.
const CACHE_CAPACITY: u64 = 10_000;

/// Read-only view of users with a read-through cache.
///
/// Writes (user creation, password change) go straight to the directory
/// and evict the affected cache entries.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserDirectory>,
    hasher: PasswordHasher,
    by_name: Cache<String, User>,
    by_id: Cache<Uuid, User>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("realm", &self.hasher.realm())
            .field("cached", &self.by_id.entry_count())
            .finish()
    }
}

impl CredentialStore {
    /// Creates a store over `users`, hashing with `hasher`.
    pub fn new(users: Arc<dyn UserDirectory>, hasher: PasswordHasher) -> Self {
        Self::with_cache_ttl(users, hasher, CACHE_TTL)
    }

    /// Creates a store with an explicit cache lifetime.
    pub fn with_cache_ttl(
        users: Arc<dyn UserDirectory>,
        hasher: PasswordHasher,
        ttl: Duration,
    ) -> Self {
        let by_name = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        let by_id = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self {
            users,
            hasher,
            by_name,
            by_id,
        }
    }

    /// The HA1 hasher (and therefore the realm).
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// The backing directory.
    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    /// Whether at least one user exists. Never cached.
    pub async fn has_any_user(&self) -> AppResult<bool> {
        Ok(self.users.count().await? > 0)
    }

    /// Finds a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let key = username.to_lowercase();
        if let Some(user) = self.by_name.get(&key).await {
            return Ok(Some(user));
        }
        let user = self.users.find_by_username(username).await?;
        if let Some(user) = &user {
            self.remember(user).await;
        }
        Ok(user)
    }

    /// Finds a user by id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        if let Some(user) = self.by_id.get(&id).await {
            return Ok(Some(user));
        }
        let user = self.users.find_by_id(id).await?;
        if let Some(user) = &user {
            self.remember(user).await;
        }
        Ok(user)
    }

    /// Checks a username/password pair against the stored HA1.
    ///
    /// Unknown users, inactive users and wrong passwords all fail with the
    /// same message. A failed last-login update is logged and ignored.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = match self.find_by_username(username).await? {
            Some(user) if user.can_login() => user,
            _ => return Err(AppError::authentication(INVALID_CREDENTIALS)),
        };

        if !self
            .hasher
            .verify_password(&user.username, password, &user.ha1)
        {
            debug!(username = %user.username, "Password mismatch");
            return Err(AppError::authentication(INVALID_CREDENTIALS));
        }

        if let Err(e) = self.users.update_last_login(user.id).await {
            warn!(user_id = %user.id, error = %e, "Failed to record last login");
        }

        Ok(user)
    }

    /// Creates a user, storing only the HA1 of `password`.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> AppResult<User> {
        let username = normalize_username(username)?;
        if password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        let ha1 = self.hasher.hash_password(&username, password)?;
        let user = self
            .users
            .create(CreateUser {
                username,
                ha1,
                is_admin,
            })
            .await?;
        self.invalidate(&user).await;
        Ok(user)
    }

    /// Recomputes and stores the HA1 for `user_id`.
    pub async fn set_password(&self, user_id: Uuid, new_password: &str) -> AppResult<()> {
        if new_password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        let ha1 = self.hasher.hash_password(&user.username, new_password)?;
        self.users.update_ha1(user.id, &ha1).await?;
        self.invalidate(&user).await;
        Ok(())
    }

    /// Verifies `current_password` before replacing it.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let stored = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))?;
        if !self
            .hasher
            .verify_password(&stored.username, current_password, &stored.ha1)
        {
            return Err(AppError::authentication("Current password is incorrect"));
        }
        self.set_password(user.id, new_password).await
    }

    /// Drops any cached copy of `user`.
    pub async fn invalidate(&self, user: &User) {
        self.by_name.invalidate(&user.username.to_lowercase()).await;
        self.by_id.invalidate(&user.id).await;
    }

    async fn remember(&self, user: &User) {
        self.by_name
            .insert(user.username.to_lowercase(), user.clone())
            .await;
        self.by_id.insert(user.id, user.clone()).await;
    }
}

/// Trims and lower-cases a username, rejecting values HA1 cannot carry
/// and values that cannot name the user's home repository.
pub fn normalize_username(username: &str) -> AppResult<String> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::validation("Username must not be empty"));
    }
    if username.contains(':') || username.chars().any(char::is_control) {
        return Err(AppError::validation(
            "Username must not contain ':' or control characters",
        ));
    }
    Repository::validate_name(&username)
        .map_err(|_| AppError::validation(format!("Invalid username '{username}'")))?;
    Ok(username)
}
