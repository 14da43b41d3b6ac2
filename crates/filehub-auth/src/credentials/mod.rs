//! Read-through credential lookups over the user directory.

pub mod store;

pub use store::CredentialStore;
