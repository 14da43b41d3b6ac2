//! Core type definitions used across the FileHub workspace.

pub mod content_type;
pub mod file_object;
pub mod path;

pub use content_type::{DEFAULT_CONTENT_TYPE, DIRECTORY_CONTENT_TYPE, content_type_for};
pub use file_object::FileObject;
