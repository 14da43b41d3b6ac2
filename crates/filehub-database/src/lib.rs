//! # filehub-database
//!
//! PostgreSQL connection management and the two directories the server
//! consults: users (with the per-user quota counter) and repositories.
//! In-memory directories back the test suites.

pub mod connection;
pub mod directory;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use directory::{RepositoryDirectory, UserDirectory};
