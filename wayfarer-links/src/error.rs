//! Link extraction error types.

use thiserror::Error;

/// Error type for link extraction.
///
/// Link-parsing failures are fatal for the whole resolution: a malformed
/// link header or hypermedia body means the response cannot be trusted for
/// navigation.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The `Link` header does not follow RFC 5988 syntax.
    #[error("Malformed Link header: {0}")]
    MalformedHeader(String),

    /// A hypermedia body shape was present but malformed.
    #[error("Malformed {parser} body: {detail}")]
    MalformedBody {
        /// The parser that rejected the body.
        parser: &'static str,
        /// What was wrong with it.
        detail: String,
    },

    /// A discovered URI could not be resolved against the request URL.
    #[error("Cannot resolve link URI {uri}: {source}")]
    Resolve {
        /// The offending URI.
        uri: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}
