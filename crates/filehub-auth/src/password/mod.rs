//! HA1 hashing for Digest-compatible credential storage.

pub mod hasher;

pub use hasher::{PasswordHasher, constant_time_eq, md5_hex};
