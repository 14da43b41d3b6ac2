//! # filehub-core
//!
//! Core crate for FileHub. Contains the storage capability trait, the
//! configuration schema, lexical path handling, and the unified error
//! system shared by the WebDAV and JSON surfaces.
//!
//! This crate has **no** internal dependencies on other FileHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
