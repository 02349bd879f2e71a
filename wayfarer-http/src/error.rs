//! HTTP orchestration error types.

use std::time::Duration;
use thiserror::Error;

/// Error type for request orchestration.
///
/// HTTP error statuses are not errors by default — they come back as
/// ordinary responses for display. Only the opt-in fail-on-status mode
/// turns them into [`HttpError::Status`].
#[derive(Debug, Error)]
pub enum HttpError {
    /// Transport-level failure (DNS, connect, TLS handshake).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The final retry attempt timed out.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Target URI could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value was not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Auth injection failed; the request was never sent.
    #[error("Auth failed: {0}")]
    Auth(String),

    /// TLS material could not be assembled.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Link extraction failed.
    #[error("Link error: {0}")]
    Link(#[from] wayfarer_links::LinkError),

    /// Body encode/decode error.
    #[error("Codec error: {0}")]
    Core(#[from] wayfarer_core::CoreError),

    /// Durable store error.
    #[error("Store error: {0}")]
    Store(#[from] wayfarer_store::StoreError),

    /// An HTTP error status, when fail-on-status mode is enabled.
    #[error("Request failed with status {0}")]
    Status(u16),
}

impl HttpError {
    /// Whether the failure is transient and a repeat attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Http(e) => e.is_timeout() || e.is_connect(),
            HttpError::Timeout(_) => true,
            _ => false,
        }
    }
}
