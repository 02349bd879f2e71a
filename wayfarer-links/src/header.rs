//! RFC 5988 `Link` header parsing.

use crate::error::LinkError;
use crate::LinkParser;
use wayfarer_core::{Link, Response};

/// Parses structured `Link` response headers.
///
/// Syntax: `<uri>; rel="name", <uri2>; rel="a b"` — comma-separated link
/// values, each with semicolon-separated parameters; a `rel` parameter may
/// name several space-separated relations for one URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderLinkParser;

impl LinkParser for HeaderLinkParser {
    fn name(&self) -> &'static str {
        "link-header"
    }

    fn parse(&self, response: &mut Response) -> Result<(), LinkError> {
        let Some(value) = response.header("link").map(str::to_string) else {
            return Ok(());
        };

        for (rel, uri) in parse_header_value(&value)? {
            response.add_link(Link::new(rel, uri));
        }
        Ok(())
    }
}

/// Parses one `Link` header value into `(relation, uri)` pairs in header
/// order.
fn parse_header_value(value: &str) -> Result<Vec<(String, String)>, LinkError> {
    let mut pairs = Vec::new();

    for entry in split_top_level(value) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some(rest) = entry.strip_prefix('<') else {
            return Err(LinkError::MalformedHeader(format!(
                "expected '<' at start of link value: {entry}"
            )));
        };
        let Some(close) = rest.find('>') else {
            return Err(LinkError::MalformedHeader(format!(
                "unterminated URI in link value: {entry}"
            )));
        };
        let uri = &rest[..close];

        for param in rest[close + 1..].split(';') {
            let Some((name, raw)) = param.split_once('=') else {
                continue;
            };
            if name.trim() != "rel" {
                continue;
            }
            let rels = raw.trim().trim_matches('"');
            for rel in rels.split_whitespace() {
                pairs.push((rel.to_string(), uri.to_string()));
            }
        }
    }

    Ok(pairs)
}

/// Splits a header value on commas that are not inside quotes or `<...>`.
fn split_top_level(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_uri = false;

    for c in value.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '<' if !in_quotes => {
                in_uri = true;
                current.push(c);
            }
            '>' if !in_quotes => {
                in_uri = false;
                current.push(c);
            }
            ',' if !in_quotes && !in_uri => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_link() {
        let pairs = parse_header_value(r#"</next>; rel="next""#).unwrap();
        assert_eq!(pairs, vec![("next".to_string(), "/next".to_string())]);
    }

    #[test]
    fn test_multiple_links_in_order() {
        let pairs = parse_header_value(
            r#"</self>; rel="self", </foo>; rel="item", </bar>; rel="item""#,
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("self".to_string(), "/self".to_string()),
                ("item".to_string(), "/foo".to_string()),
                ("item".to_string(), "/bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiple_relations_per_link() {
        let pairs = parse_header_value(r#"</x>; rel="first prev""#).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("first".to_string(), "/x".to_string()),
                ("prev".to_string(), "/x".to_string()),
            ]
        );
    }

    #[test]
    fn test_unquoted_rel() {
        let pairs = parse_header_value("</n>; rel=next").unwrap();
        assert_eq!(pairs, vec![("next".to_string(), "/n".to_string())]);
    }

    #[test]
    fn test_ignores_other_params() {
        let pairs =
            parse_header_value(r#"</n>; title="a, b"; rel="next"; type="text/html""#).unwrap();
        assert_eq!(pairs, vec![("next".to_string(), "/n".to_string())]);
    }

    #[test]
    fn test_malformed_is_fatal() {
        assert!(parse_header_value("no angle brackets; rel=x").is_err());
        assert!(parse_header_value("</unterminated; rel=x").is_err());
    }
}
