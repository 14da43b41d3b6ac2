//! WebDAV method implementations.

pub mod copy_move;
pub mod delete;
pub mod get_put;
pub mod mkcol;
pub mod propfind;

pub use copy_move::{handle_copy, handle_move};
pub use delete::handle_delete;
pub use get_put::{handle_get, handle_head, handle_put};
pub use mkcol::handle_mkcol;
pub use propfind::handle_propfind;
