//! HAL `_links` object parsing.

use crate::error::LinkError;
use crate::LinkParser;
use wayfarer_core::{Body, Link, Response};

/// Parses a HAL-style `_links` object: relation → `{href}` (or a list of
/// them). The reserved `curies` relation is documentation metadata, never a
/// navigable link.
#[derive(Debug, Default, Clone, Copy)]
pub struct HalParser;

impl LinkParser for HalParser {
    fn name(&self) -> &'static str {
        "hal"
    }

    fn parse(&self, response: &mut Response) -> Result<(), LinkError> {
        let Some(links) = response.body.get("_links") else {
            return Ok(());
        };

        let entries = match links {
            Body::Map(entries) => entries.clone(),
            Body::Null => return Ok(()),
            other => {
                return Err(LinkError::MalformedBody {
                    parser: "hal",
                    detail: format!("_links must be an object, got {other:?}"),
                })
            }
        };

        for (key, value) in &entries {
            let rel = key.as_relation();
            if rel == "curies" {
                continue;
            }

            match value {
                Body::Map(_) => {
                    if let Some(href) = href_of(value) {
                        response.add_link(Link::new(rel, href));
                    }
                }
                Body::List(items) => {
                    for item in items {
                        if let Some(href) = href_of(item) {
                            response.add_link(Link::new(rel.clone(), href));
                        }
                    }
                }
                // Null or scalar entries carry no navigable target
                _ => {}
            }
        }

        Ok(())
    }
}

/// Extracts the `href` string from a link object.
fn href_of(value: &Body) -> Option<String> {
    value.get("href")?.as_str().map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================
