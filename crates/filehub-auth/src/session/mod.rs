//! Cookie sessions: an in-memory store plus its periodic reaper.

pub mod cleanup;
pub mod store;

pub use cleanup::spawn_reaper;
pub use store::{Session, SessionStore};
