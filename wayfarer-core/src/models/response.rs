//! Response and link models.

use crate::body::Body;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator used when multiple values exist for one header name.
pub const HEADER_JOIN: &str = ", ";

// ============================================================================
// Link
// ============================================================================

/// A hypermedia link extracted from a response.
///
/// The URI is always absolute; resolution against the request URL happens
/// exactly once, when the link parsers run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name (e.g. `next`, `self`, `item`).
    pub rel: String,
    /// Absolute URI of the target resource.
    pub uri: String,
}

impl Link {
    /// Creates a new link.
    pub fn new(rel: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            uri: uri.into(),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A decoded HTTP response.
///
/// This is the unit handed to formatters and to the pagination engine. The
/// pagination accumulator is a clone of the first page whose `body` and
/// `links` are progressively extended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version (e.g. `HTTP/1.1`, `HTTP/2.0`).
    pub proto: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers; multiple values for one name are joined
    /// with [`HEADER_JOIN`].
    pub headers: BTreeMap<String, String>,
    /// Extracted links, per relation, in discovery order.
    pub links: BTreeMap<String, Vec<Link>>,
    /// Decoded body.
    pub body: Body,
}

impl Response {
    /// Returns the first link for the given relation, if any.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.get(rel).and_then(|links| links.first())
    }

    /// Adds a link under its relation.
    pub fn add_link(&mut self, link: Link) {
        self.links.entry(link.rel.clone()).or_default().push(link);
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the status is a 2xx success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_lookup() {
        let mut resp = Response::default();
        resp.add_link(Link::new("next", "https://example.com/page2"));
        resp.add_link(Link::new("item", "https://example.com/a"));
        resp.add_link(Link::new("item", "https://example.com/b"));

        assert_eq!(resp.link("next").unwrap().uri, "https://example.com/page2");
        assert_eq!(resp.links.get("item").unwrap().len(), 2);
        assert!(resp.link("prev").is_none());
    }

    #[test]
    fn test_header_case_insensitive() {
        let mut resp = Response::default();
        resp.headers
            .insert("Content-Type".to_string(), "application/json".to_string());

        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
    }
}
