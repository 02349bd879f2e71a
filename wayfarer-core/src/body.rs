//! Decoded response body model.
//!
//! Every codec decodes into [`Body`], a tagged sum type over the shapes a
//! wire format can produce. Link parsers and the pagination engine walk this
//! type explicitly instead of downcasting runtime values.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Map Key
// ============================================================================

/// A key in a decoded map.
///
/// JSON maps are always string-keyed, but YAML (and binary formats) permit
/// integer keys, so both are representable. The link walker stringifies
/// integer keys when they are used as relation names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapKey {
    /// String key.
    Str(String),
    /// Integer key.
    Int(i64),
}

impl MapKey {
    /// Returns the key as a relation name, stringifying integer keys.
    pub fn as_relation(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
        }
    }

    /// Returns the string form of the key if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

// ============================================================================
// Body
// ============================================================================

/// A decoded response body.
///
/// Maps preserve insertion order so link discovery and pagination merging
/// are deterministic. [`Body::Raw`] holds undecoded bytes when no codec
/// matched the response; callers degrade gracefully instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Body {
    /// No body, or an explicit null.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
    /// Ordered list of values.
    List(Vec<Body>),
    /// Ordered map of key/value pairs.
    Map(Vec<(MapKey, Body)>),
    /// Undecoded raw bytes (codec fallback).
    Raw(Vec<u8>),
}

impl Body {
    /// Returns true if the body is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the list elements if the body is a list.
    pub fn as_list(&self) -> Option<&[Body]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the string value if the body is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the map entries if the body is a map.
    pub fn as_map(&self) -> Option<&[(MapKey, Body)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a string key in a map body.
    pub fn get(&self, key: &str) -> Option<&Body> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Appends another body's list elements to this list body.
    ///
    /// Returns false (and leaves self untouched) unless both are lists.
    pub fn extend_list(&mut self, other: &Body) -> bool {
        match (self, other) {
            (Self::List(dst), Self::List(src)) => {
                dst.extend(src.iter().cloned());
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Body::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (MapKey::Str(k), Body::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_yaml::Value> for Body {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_yaml::Value::String(s) => Self::Str(s),
            serde_yaml::Value::Sequence(items) => {
                Self::List(items.into_iter().map(Body::from).collect())
            }
            serde_yaml::Value::Mapping(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Body::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Body::from(tagged.value),
        }
    }
}

/// Converts a YAML mapping key, preserving integer keys.
fn yaml_key(key: serde_yaml::Value) -> MapKey {
    match key {
        serde_yaml::Value::Number(n) if n.is_i64() => MapKey::Int(n.as_i64().unwrap_or(0)),
        serde_yaml::Value::String(s) => MapKey::Str(s),
        other => MapKey::Str(
            serde_yaml::to_string(&other)
                .unwrap_or_default()
                .trim_end()
                .to_string(),
        ),
    }
}

impl From<&Body> for serde_json::Value {
    fn from(body: &Body) -> Self {
        match body {
            Body::Null => serde_json::Value::Null,
            Body::Bool(b) => serde_json::Value::Bool(*b),
            Body::Int(i) => serde_json::Value::from(*i),
            Body::Float(f) => serde_json::Value::from(*f),
            Body::Str(s) => serde_json::Value::String(s.clone()),
            Body::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Body::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_relation(), serde_json::Value::from(v)))
                    .collect(),
            ),
            // Raw bytes render lossily; formatters that need the exact bytes
            // read Body::Raw directly.
            Body::Raw(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_preserves_shape() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [true, null], "c": 1.5}"#).unwrap();
        let body = Body::from(value);

        assert_eq!(body.get("a"), Some(&Body::Int(1)));
        assert_eq!(
            body.get("b"),
            Some(&Body::List(vec![Body::Bool(true), Body::Null]))
        );
        assert_eq!(body.get("c"), Some(&Body::Float(1.5)));
    }

    #[test]
    fn test_yaml_integer_keys() {
        let value: serde_yaml::Value = serde_yaml::from_str("1: one\ntwo: 2").unwrap();
        let body = Body::from(value);

        let entries = body.as_map().unwrap();
        assert_eq!(entries[0].0, MapKey::Int(1));
        assert_eq!(entries[0].0.as_relation(), "1");
        assert_eq!(entries[1].0, MapKey::Str("two".to_string()));
    }

    #[test]
    fn test_extend_list() {
        let mut body = Body::List(vec![Body::Int(1), Body::Int(2)]);
        assert!(body.extend_list(&Body::List(vec![Body::Int(3)])));
        assert_eq!(body.as_list().unwrap().len(), 3);

        // Non-list source leaves the accumulator untouched
        assert!(!body.extend_list(&Body::Str("nope".to_string())));
        assert_eq!(body.as_list().unwrap().len(), 3);
    }

    #[test]
    fn test_get_on_non_map() {
        assert_eq!(Body::List(vec![]).get("key"), None);
        assert_eq!(Body::Null.get("key"), None);
    }
}
