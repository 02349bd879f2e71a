//! `links` array parsing (`{rel: [...], href}` objects).

use crate::error::LinkError;
use crate::LinkParser;
use wayfarer_core::{Body, Link, Response};

/// Parses a top-level `links` array of `{rel: [...], href}` objects, where
/// one entry may claim several relations for the same URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelArrayParser;

impl LinkParser for RelArrayParser {
    fn name(&self) -> &'static str {
        "rel-array"
    }

    fn parse(&self, response: &mut Response) -> Result<(), LinkError> {
        let Some(Body::List(entries)) = response.body.get("links") else {
            // A map-shaped `links` belongs to other parsers
            return Ok(());
        };
        let entries = entries.clone();

        for entry in &entries {
            let Body::Map(_) = entry else {
                return Err(LinkError::MalformedBody {
                    parser: "rel-array",
                    detail: "links array entries must be objects".to_string(),
                });
            };

            let Some(href) = entry.get("href").and_then(Body::as_str) else {
                continue;
            };
            let Some(Body::List(rels)) = entry.get("rel") else {
                continue;
            };

            for rel in rels {
                if let Some(rel) = rel.as_str() {
                    response.add_link(Link::new(rel, href));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
