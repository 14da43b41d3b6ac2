//! WebDAV adapter for FileHub (RFC 4918 subset).
//!
//! Translates PROPFIND, GET, HEAD, PUT, DELETE, MKCOL, COPY and MOVE into
//! storage operations on the caller's home repository. Locking and
//! property updates are not supported.

pub mod destination;
pub mod error;
pub mod handler;
pub mod methods;
pub mod properties;
pub mod response;

pub use handler::{DAV_PREFIX, DavHandler};
