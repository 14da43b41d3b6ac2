//! Repository directory backed by the `repositories` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use filehub_core::error::{AppError, ErrorKind};
use filehub_core::result::AppResult;
use filehub_entity::repository::{CreateRepository, Repository};

use super::map_write_error;
use crate::directory::RepositoryDirectory;

/// Postgres implementation of [`RepositoryDirectory`].
#[derive(Debug, Clone)]
pub struct PgRepositoryDirectory {
    pool: PgPool,
}

impl PgRepositoryDirectory {
    /// Create a new repository directory.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepositoryDirectory for PgRepositoryDirectory {
    async fn find_home(&self, owner_id: Uuid) -> AppResult<Option<Repository>> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE owner_id = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find home repository", e)
        })
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Repository>> {
        sqlx::query_as::<_, Repository>("SELECT * FROM repositories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find repository", e)
            })
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Repository>> {
        sqlx::query_as::<_, Repository>(
            "SELECT * FROM repositories WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list repositories", e))
    }

    async fn create(&self, input: CreateRepository) -> AppResult<Repository> {
        Repository::validate_name(&input.name)?;
        input.root_uri.parse::<filehub_entity::repository::RepositoryUri>()?;

        sqlx::query_as::<_, Repository>(
            "INSERT INTO repositories (id, owner_id, name, root_uri) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(input.owner_id)
        .bind(&input.name)
        .bind(&input.root_uri)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Failed to create repository",
                format!("Repository '{}' already exists", input.name),
            )
        })
    }
}
