//! Digest nonces with a bounded replay window.

pub mod store;

pub use store::NonceStore;
