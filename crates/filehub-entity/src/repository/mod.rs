//! Repository domain entities.

pub mod model;
pub mod uri;

pub use model::{CreateRepository, Repository};
pub use uri::RepositoryUri;
