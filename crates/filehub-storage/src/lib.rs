//! # filehub-storage
//!
//! Storage backends for FileHub repositories. A repository's root URI
//! picks the backend: `file://` roots use the local filesystem and
//! `s3://` roots use an S3-compatible object store with hash-prefixed keys.

pub mod backend;
pub mod keys;
pub mod manager;
pub mod providers;

pub use backend::StorageBackend;
pub use manager::StorageManager;
