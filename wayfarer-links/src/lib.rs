// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wayfarer Links
//!
//! Hypermedia link extraction for the Wayfarer client.
//!
//! A [`LinkResolver`] runs an ordered chain of format-specific parsers over
//! a decoded response. The shapes are independent and mutually
//! non-exclusive; a response may match more than one:
//!
//! - [`HeaderLinkParser`] — RFC 5988 `Link` headers
//! - [`HalParser`] — HAL `_links` objects
//! - [`SelfWalkParser`] — generic recursive `self`-key walk
//! - [`RelArrayParser`] — `links` arrays of `{rel: [...], href}` objects
//! - [`JsonApiParser`] — JSON:API `links` maps and resource self-links
//!
//! A failure from any parser aborts the whole resolution. After all parsers
//! run, every discovered URI is resolved to an absolute URL against the
//! request URL exactly once.

pub mod error;
pub mod hal;
pub mod header;
pub mod json_api;
pub mod rel_array;
pub mod walker;

pub use error::LinkError;
pub use hal::HalParser;
pub use header::HeaderLinkParser;
pub use json_api::JsonApiParser;
pub use rel_array::RelArrayParser;
pub use walker::SelfWalkParser;

use tracing::debug;
use url::Url;
use wayfarer_core::Response;

// ============================================================================
// Link Parser Trait
// ============================================================================

/// One format-specific link extractor.
///
/// Parsers contribute links to `response.links` in discovery order and
/// leave URIs exactly as the body spelled them; the resolver makes them
/// absolute afterwards.
pub trait LinkParser: Send + Sync {
    /// Short identifier for diagnostics.
    fn name(&self) -> &'static str;

    /// Extracts links from the response, appending to `response.links`.
    fn parse(&self, response: &mut Response) -> Result<(), LinkError>;
}

// ============================================================================
// Link Resolver
// ============================================================================

/// Ordered chain of link parsers with one-time absolute-URL resolution.
///
/// The resolver is an explicit value handed to the client; there is no
/// global parser registration.
pub struct LinkResolver {
    parsers: Vec<Box<dyn LinkParser>>,
}

impl LinkResolver {
    /// Creates a resolver with no parsers.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Creates a resolver with the full built-in parser chain.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(HeaderLinkParser),
                Box::new(HalParser),
                Box::new(SelfWalkParser),
                Box::new(RelArrayParser),
                Box::new(JsonApiParser),
            ],
        }
    }

    /// Appends a parser to the chain.
    pub fn add_parser(&mut self, parser: Box<dyn LinkParser>) {
        self.parsers.push(parser);
    }

    /// Runs the parser chain and resolves every link against `base`.
    ///
    /// Any parser failure aborts the whole resolution; a malformed
    /// hypermedia body means the response cannot be trusted for navigation.
    pub fn parse_links(&self, base: &Url, response: &mut Response) -> Result<(), LinkError> {
        for parser in &self.parsers {
            parser.parse(response)?;
        }

        for links in response.links.values_mut() {
            for link in links.iter_mut() {
                let absolute = base.join(&link.uri).map_err(|source| LinkError::Resolve {
                    uri: link.uri.clone(),
                    source,
                })?;
                link.uri = absolute.to_string();
            }
        }

        let total: usize = response.links.values().map(Vec::len).sum();
        if total > 0 {
            debug!(
                relations = response.links.len(),
                links = total,
                "Extracted links"
            );
        }
        Ok(())
    }
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
