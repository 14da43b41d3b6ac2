//! Request and response bodies of the JSON surface.

pub mod request;
pub mod response;
