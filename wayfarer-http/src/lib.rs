// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wayfarer HTTP
//!
//! Request orchestration for the Wayfarer client. This crate owns the full
//! request path:
//!
//! - [`RequestEnricher`] — profile defaults, per-invocation overrides,
//!   negotiated `Accept` headers, and auth injection
//! - [`AuthRegistry`] — pluggable auth handlers (basic, bearer, API key)
//! - [`tls`] — client assembly, including lazily-loaded hardware-token
//!   identities behind a [`PinSource`]
//! - [`Transport`] — one cache-aware physical exchange
//! - [`RetryExecutor`] — idempotent retry honoring server backoff hints
//! - [`Paginator`] — transparent `next`-link merging
//!
//! [`ApiClient`] ties these together behind a builder.

pub mod auth;
pub mod client;
pub mod enrich;
pub mod error;
pub mod paginate;
pub mod retry;
pub mod tls;
pub mod transport;

pub use auth::{AuthHandler, AuthParam, AuthRegistry};
pub use client::{ApiClient, ApiClientBuilder};
pub use enrich::{Overrides, PreparedRequest, RequestEnricher};
pub use error::HttpError;
pub use paginate::{PageFetcher, Paginator};
pub use retry::{RetryExecutor, RetryPolicy, Sleeper};
pub use tls::{EnvPinSource, HardwareIdentity, PinSource, StaticPinSource};
pub use transport::{RawResponse, Transport};
