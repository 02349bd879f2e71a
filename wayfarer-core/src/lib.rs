// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wayfarer Core
//!
//! Core types, models, and the codec registry for the Wayfarer client.
//!
//! This crate provides the foundational abstractions used across all other
//! Wayfarer crates, including:
//!
//! - The decoded body model ([`Body`], [`MapKey`]) — a tagged sum type over
//!   null/bool/number/string/list/map that every codec decodes into and
//!   every link parser walks over
//! - Response models ([`Response`], [`Link`])
//! - API profile configuration ([`ApiConfig`], [`ApiProfile`], [`TlsConfig`])
//! - The body codec contract ([`BodyCodec`]) and the content-negotiation
//!   registry ([`CodecRegistry`])
//! - Error types ([`CoreError`])

pub mod body;
pub mod codec;
pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export the body model
pub use body::{Body, MapKey};

// Re-export codec types
pub use codec::{BodyCodec, CodecRegistry, JsonCodec, YamlCodec};

// Re-export all model types
pub use models::{
    ApiConfig, ApiProfile, AuthDescriptor, HardwareTokenConfig, Link, Response, TlsConfig,
};
