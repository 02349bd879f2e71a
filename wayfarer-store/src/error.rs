//! Store error types.

use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Named API not found in configuration.
    #[error("Unknown API: {0}")]
    UnknownApi(String),

    /// Named profile not found for an API.
    #[error("Unknown profile {profile} for API {api}")]
    UnknownProfile {
        /// API name.
        api: String,
        /// Profile name.
        profile: String,
    },
}
