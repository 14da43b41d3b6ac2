//! PostgreSQL-backed directory implementations.

pub mod repository;
pub mod user;

pub use repository::PgRepositoryDirectory;
pub use user::PgUserDirectory;

use filehub_core::error::{AppError, ErrorKind};

/// Map an sqlx error, turning unique violations into conflicts.
pub(crate) fn map_write_error(err: sqlx::Error, context: &str, conflict: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(conflict),
        _ => AppError::with_source(ErrorKind::Database, context.to_string(), err),
    }
}
