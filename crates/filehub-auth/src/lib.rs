//! # filehub-auth
//!
//! Authentication for the FileHub WebDAV and JSON surfaces.
//!
//! ## Modules
//!
//! - `password`: HA1 (`MD5(username:realm:password)`) hashing and constant-time checks
//! - `credentials`: read-through cache over the user directory
//! - `session`: cookie sessions with a periodic reaper
//! - `nonce`: Digest nonces with a bounded replay window
//! - `basic` / `digest`: `Authorization` header parsing and verification
//! - `mediator`: the per-request pipeline tying the above together

pub mod basic;
pub mod credentials;
pub mod digest;
pub mod mediator;
pub mod nonce;
pub mod password;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use mediator::{AuthMethod, AuthRejection, AuthenticatedUser, Authenticator};
pub use nonce::NonceStore;
pub use password::PasswordHasher;
pub use session::{Session, SessionStore};
