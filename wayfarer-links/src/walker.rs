//! Generic `self`-key body walker.

use crate::error::LinkError;
use crate::LinkParser;
use wayfarer_core::{Body, Link, Response};

/// Walks the whole decoded body, treating any map key literally named
/// `self` with a string value as a self-link.
///
/// Relation naming follows the body structure: the top level contributes
/// `self`, a nested map under key `k` contributes `k`, and objects inside a
/// list under key `k` contribute `k-item`. Integer map keys are stringified
/// before use as relation names, so string- and integer-keyed maps walk
/// uniformly.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfWalkParser;

impl LinkParser for SelfWalkParser {
    fn name(&self) -> &'static str {
        "self-walk"
    }

    fn parse(&self, response: &mut Response) -> Result<(), LinkError> {
        let mut found = Vec::new();
        walk(&response.body, "self", &mut found);
        for link in found {
            response.add_link(link);
        }
        Ok(())
    }
}

fn walk(body: &Body, rel: &str, out: &mut Vec<Link>) {
    match body {
        Body::Map(entries) => {
            for (key, value) in entries {
                let key = key.as_relation();
                if key == "self" {
                    if let Some(uri) = value.as_str() {
                        out.push(Link::new(rel, uri));
                        continue;
                    }
                }
                walk(value, &key, out);
            }
        }
        Body::List(items) => {
            let item_rel = format!("{rel}-item");
            for item in items {
                walk(item, &item_rel, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(body: &str) -> Response {
        Response {
            body: Body::from(serde_json::from_str::<serde_json::Value>(body).unwrap()),
            ..Response::default()
        }
    }

    #[test]
    fn test_top_level_self() {
        let mut resp = response_with(r#"{"self": "/me", "name": "x"}"#);
        SelfWalkParser.parse(&mut resp).unwrap();
        assert_eq!(resp.link("self").unwrap().uri, "/me");
    }

    #[test]
    fn test_array_items_namespaced() {
        let mut resp = response_with(
            r#"{"users": [{"self": "/users/1"}, {"self": "/users/2"}]}"#,
        );
        SelfWalkParser.parse(&mut resp).unwrap();

        let links = resp.links.get("users-item").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].uri, "/users/1");
        assert_eq!(links[1].uri, "/users/2");
    }

    #[test]
    fn test_nested_map_uses_key_as_rel() {
        let mut resp = response_with(r#"{"owner": {"self": "/owners/9"}}"#);
        SelfWalkParser.parse(&mut resp).unwrap();
        assert_eq!(resp.link("owner").unwrap().uri, "/owners/9");
    }

    #[test]
    fn test_integer_keys_stringified() {
        use wayfarer_core::MapKey;

        let body = Body::Map(vec![(
            MapKey::Int(7),
            Body::Map(vec![(MapKey::Str("self".to_string()), Body::Str("/seven".to_string()))]),
        )]);
        let mut resp = Response {
            body,
            ..Response::default()
        };
        SelfWalkParser.parse(&mut resp).unwrap();
        assert_eq!(resp.link("7").unwrap().uri, "/seven");
    }

    #[test]
    fn test_non_string_self_is_not_a_link() {
        let mut resp = response_with(r#"{"self": {"href": "/x"}}"#);
        SelfWalkParser.parse(&mut resp).unwrap();
        assert!(resp.links.is_empty());
    }
}
