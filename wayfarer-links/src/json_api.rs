//! JSON:API-style link parsing.

use crate::error::LinkError;
use crate::LinkParser;
use wayfarer_core::{Body, Link, Response};

/// Parses the JSON:API link shape: top-level `links` is a map of relation →
/// bare URI string, while each resource under `data` carries
/// `links.self.href`.
///
/// Resource self-links are exposed under the `item` relation, in document
/// order.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonApiParser;

impl LinkParser for JsonApiParser {
    fn name(&self) -> &'static str {
        "json-api"
    }

    fn parse(&self, response: &mut Response) -> Result<(), LinkError> {
        let mut found = Vec::new();

        // Top-level links: relation → bare string
        if let Some(Body::Map(entries)) = response.body.get("links") {
            for (key, value) in entries {
                if let Some(uri) = value.as_str() {
                    found.push(Link::new(key.as_relation(), uri));
                }
            }
        }

        // Resource objects: data[*].links.self.href
        if let Some(Body::List(resources)) = response.body.get("data") {
            for resource in resources {
                let self_link = resource
                    .get("links")
                    .and_then(|links| links.get("self"))
                    .and_then(|s| s.get("href"))
                    .and_then(Body::as_str);
                if let Some(uri) = self_link {
                    found.push(Link::new("item", uri));
                }
            }
        }

        for link in found {
            response.add_link(link);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
