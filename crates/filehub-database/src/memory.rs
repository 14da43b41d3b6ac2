//! In-memory directories for tests and database-less tooling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_entity::repository::{CreateRepository, Repository, RepositoryUri};
use filehub_entity::user::{CreateUser, User};

use crate::directory::{RepositoryDirectory, UserDirectory};

/// Map-backed [`UserDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    fail_last_login: AtomicBool,
}

impl InMemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `update_last_login` call fail.
    pub fn fail_last_login_updates(&self, fail: bool) {
        self.fail_last_login.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.username.to_lowercase());
        Ok(users)
    }

    async fn create(&self, input: CreateUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&input.username))
        {
            return Err(AppError::conflict(format!(
                "User '{}' already exists",
                input.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: input.username,
            ha1: input.ha1,
            is_active: true,
            is_admin: input.is_admin,
            used_bytes: 0,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_last_login(&self, id: Uuid) -> AppResult<()> {
        if self.fail_last_login.load(Ordering::SeqCst) {
            return Err(AppError::database("last login update rejected"));
        }
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_ha1(&self, id: Uuid, ha1: &str) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.ha1 = ha1.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn adjust_used_bytes(&self, id: Uuid, delta: i64) -> AppResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.used_bytes = (user.used_bytes + delta).max(0);
        }
        Ok(())
    }
}

/// Map-backed [`RepositoryDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryRepositoryDirectory {
    repositories: RwLock<Vec<Repository>>,
}

impl InMemoryRepositoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepositoryDirectory for InMemoryRepositoryDirectory {
    async fn find_home(&self, owner_id: Uuid) -> AppResult<Option<Repository>> {
        let repos = self.repositories.read().await;
        Ok(repos.iter().find(|r| r.owner_id == owner_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Repository>> {
        let repos = self.repositories.read().await;
        Ok(repos.iter().find(|r| r.name == name).cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Repository>> {
        let repos = self.repositories.read().await;
        Ok(repos
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, input: CreateRepository) -> AppResult<Repository> {
        Repository::validate_name(&input.name)?;
        input.root_uri.parse::<RepositoryUri>()?;

        let mut repos = self.repositories.write().await;
        if repos.iter().any(|r| r.name == input.name) {
            return Err(AppError::conflict(format!(
                "Repository '{}' already exists",
                input.name
            )));
        }

        let repo = Repository {
            id: Uuid::now_v7(),
            owner_id: input.owner_id,
            name: input.name,
            root_uri: input.root_uri,
            created_at: Utc::now(),
        };
        repos.push(repo.clone());
        Ok(repo)
    }
}
