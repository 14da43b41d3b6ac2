//! # filehub-api
//!
//! HTTP layer for FileHub built on Axum.
//!
//! Mounts the WebDAV adapter under `/dav` and the authentication-related
//! JSON endpoints under `/api`, together with the auth mediator
//! middleware, request logging and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use error::ApiError;
pub use state::AppState;
