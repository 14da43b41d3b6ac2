//! # filehub-entity
//!
//! Domain entity models for FileHub. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod repository;
pub mod user;
