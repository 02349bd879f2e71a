//! CLI command implementations.

pub mod api;
pub mod cache;
pub mod request;
