// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wayfarer Store
//!
//! Durable state for the Wayfarer client:
//!
//! - [`ResponseCache`] — per-entry response cache keyed by request
//!   signature digest, with freshness expiry
//! - [`FreshnessIndex`] — per-API description-document expiry timestamps
//! - [`ApiStore`] — named API/profile configuration
//! - [`TokenCache`] — auth handler state, namespaced per `api:profile`
//! - [`persistence`] — atomic JSON file helpers with restrictive
//!   permissions
//!
//! All writes are atomic (temp file + rename) so independently-launched
//! processes sharing these files never observe a torn write.

pub mod cache;
pub mod error;
pub mod freshness;
pub mod persistence;
pub mod profiles;
pub mod tokens;

pub use cache::{CacheEntry, ResponseCache};
pub use error::StoreError;
pub use freshness::FreshnessIndex;
pub use persistence::{
    default_apis_path, default_cache_dir, default_config_dir, default_freshness_path,
    default_responses_dir, default_tokens_path,
};
pub use profiles::ApiStore;
pub use tokens::TokenCache;
