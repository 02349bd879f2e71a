//! Core error types.

use thiserror::Error;

/// Error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encode/decode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encode/decode error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No codec is registered for the given content type.
    #[error("No codec registered for content type: {0}")]
    UnsupportedContentType(String),

    /// A body cannot be encoded by the selected codec.
    #[error("Cannot encode body: {0}")]
    Encode(String),

    /// Profile configuration is invalid.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}
