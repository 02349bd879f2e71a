//! Body codecs and the content-negotiation registry.
//!
//! A codec turns bytes into the [`Body`] model and back for one family of
//! content types. The registry owns an explicit set of codecs with priority
//! weights and builds the `Accept` / `Accept-Encoding` headers from them.
//! Registries are plain values passed into constructors; there is no global
//! codec state, so tests can run with isolated registries.

use crate::body::Body;
use crate::error::CoreError;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Codec Contract
// ============================================================================

/// Marshal/unmarshal capability for one content-type family.
pub trait BodyCodec: Send + Sync {
    /// Content types this codec claims (without parameters).
    fn content_types(&self) -> &[&str];

    /// Returns true if this codec handles the given content type.
    ///
    /// The default implementation compares against [`content_types`]
    /// after stripping parameters.
    ///
    /// [`content_types`]: BodyCodec::content_types
    fn matches(&self, content_type: &str) -> bool {
        let essence = essence(content_type);
        self.content_types().iter().any(|ct| *ct == essence)
    }

    /// Cheaply guesses whether the bytes are in this codec's format.
    ///
    /// Used to probe for a codec when the response carries no usable
    /// content type. A false positive is recovered by the decode fallback.
    fn detect(&self, data: &[u8]) -> bool;

    /// Encodes a body to bytes.
    fn marshal(&self, body: &Body) -> Result<Vec<u8>, CoreError>;

    /// Decodes bytes into a body.
    fn unmarshal(&self, data: &[u8]) -> Result<Body, CoreError>;
}

/// Strips parameters (`; charset=...`) from a content type.
fn essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

// ============================================================================
// JSON Codec
// ============================================================================

/// JSON codec; also claims `+json` structured-suffix types (HAL, JSON:API).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn content_types(&self) -> &[&str] {
        &["application/json"]
    }

    fn matches(&self, content_type: &str) -> bool {
        let essence = essence(content_type);
        essence == "application/json" || essence.ends_with("+json")
    }

    fn detect(&self, data: &[u8]) -> bool {
        // First non-whitespace byte is enough to recognize JSON; a false
        // positive falls through to the raw-body path.
        data.iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| matches!(b, b'{' | b'[' | b'"' | b'-' | b'0'..=b'9' | b't' | b'f' | b'n'))
    }

    fn marshal(&self, body: &Body) -> Result<Vec<u8>, CoreError> {
        let value = serde_json::Value::from(body);
        Ok(serde_json::to_vec(&value)?)
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Body, CoreError> {
        let value: serde_json::Value = serde_json::from_slice(data)?;
        Ok(Body::from(value))
    }
}

// ============================================================================
// YAML Codec
// ============================================================================

/// YAML codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlCodec;

impl BodyCodec for YamlCodec {
    fn content_types(&self) -> &[&str] {
        &["application/yaml", "application/x-yaml", "text/yaml"]
    }

    fn detect(&self, _data: &[u8]) -> bool {
        // YAML has no reliable magic; never claim unlabeled bodies.
        false
    }

    fn marshal(&self, body: &Body) -> Result<Vec<u8>, CoreError> {
        let value = serde_json::Value::from(body);
        let text = serde_yaml::to_string(&value)?;
        Ok(text.into_bytes())
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Body, CoreError> {
        let value: serde_yaml::Value = serde_yaml::from_slice(data)?;
        Ok(Body::from(value))
    }
}

// ============================================================================
// Codec Registry
// ============================================================================

/// One registered codec with its negotiation weight.
struct CodecEntry {
    content_type: String,
    priority: f32,
    codec: Arc<dyn BodyCodec>,
}

/// Registry of body codecs and decompression capabilities.
///
/// Priorities become `q` factors in the `Accept` header; entries with a
/// negative priority are usable for decoding but never advertised.
pub struct CodecRegistry {
    entries: Vec<CodecEntry>,
    encodings: Vec<String>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            encodings: Vec::new(),
        }
    }

    /// Creates a registry with the built-in codecs and encodings.
    ///
    /// JSON is preferred (1.0), YAML accepted at 0.5. Gzip and brotli match
    /// the HTTP client's transparent decompression capabilities.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("application/json", 1.0, Arc::new(JsonCodec));
        registry.register("application/yaml", 0.5, Arc::new(YamlCodec));
        registry.register_encoding("gzip");
        registry.register_encoding("br");
        registry
    }

    /// Registers a codec under a content type with a negotiation priority.
    pub fn register(&mut self, content_type: &str, priority: f32, codec: Arc<dyn BodyCodec>) {
        debug!(content_type, priority, "Registering codec");
        self.entries.push(CodecEntry {
            content_type: content_type.to_string(),
            priority,
            codec,
        });
    }

    /// Registers a supported content encoding (for `Accept-Encoding`).
    pub fn register_encoding(&mut self, name: &str) {
        self.encodings.push(name.to_string());
    }

    /// Builds the weighted `Accept` header value.
    ///
    /// Entries are sorted by descending priority, negative priorities are
    /// omitted, and a wildcard fallback is always appended.
    pub fn accept_header(&self) -> String {
        let mut weighted: Vec<&CodecEntry> =
            self.entries.iter().filter(|e| e.priority >= 0.0).collect();
        weighted.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut parts: Vec<String> = weighted
            .iter()
            .map(|e| {
                if (e.priority - 1.0).abs() < f32::EPSILON {
                    e.content_type.clone()
                } else {
                    format!("{};q={}", e.content_type, e.priority)
                }
            })
            .collect();
        parts.push("*/*".to_string());
        parts.join(", ")
    }

    /// Builds the `Accept-Encoding` header value, if any encodings are
    /// registered.
    pub fn accept_encoding_header(&self) -> Option<String> {
        if self.encodings.is_empty() {
            None
        } else {
            Some(self.encodings.join(", "))
        }
    }

    /// Finds the codec claiming the given content type.
    pub fn codec_for(&self, content_type: &str) -> Option<&dyn BodyCodec> {
        self.entries
            .iter()
            .find(|e| e.codec.matches(content_type))
            .map(|e| e.codec.as_ref())
    }

    /// Encodes a body for the given content type.
    pub fn marshal(&self, content_type: &str, body: &Body) -> Result<Vec<u8>, CoreError> {
        let codec = self
            .codec_for(content_type)
            .ok_or_else(|| CoreError::UnsupportedContentType(content_type.to_string()))?;
        codec.marshal(body)
    }

    /// Decodes bytes using the declared content type, falling back to
    /// format detection, and finally to the raw bytes.
    ///
    /// A body that does not match its declared format degrades to
    /// [`Body::Raw`] rather than failing the request.
    pub fn decode(&self, content_type: Option<&str>, data: &[u8]) -> Body {
        if data.is_empty() {
            return Body::Null;
        }

        if let Some(ct) = content_type {
            if let Some(codec) = self.codec_for(ct) {
                match codec.unmarshal(data) {
                    Ok(body) => return body,
                    Err(e) => {
                        debug!(content_type = ct, error = %e, "Decode failed, keeping raw body");
                        return Body::Raw(data.to_vec());
                    }
                }
            }
        }

        // No usable content type: probe registered codecs in order.
        for entry in &self.entries {
            if entry.codec.detect(data) {
                if let Ok(body) = entry.codec.unmarshal(data) {
                    return body;
                }
            }
        }

        Body::Raw(data.to_vec())
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field(
                "content_types",
                &self
                    .entries
                    .iter()
                    .map(|e| e.content_type.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("encodings", &self.encodings)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_header_weights() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(
            registry.accept_header(),
            "application/json, application/yaml;q=0.5, */*"
        );
    }

    #[test]
    fn test_accept_header_omits_negative_priority() {
        let mut registry = CodecRegistry::new();
        registry.register("application/json", 1.0, Arc::new(JsonCodec));
        registry.register("application/yaml", -1.0, Arc::new(YamlCodec));

        assert_eq!(registry.accept_header(), "application/json, */*");
        // Still usable for decoding
        assert!(registry.codec_for("application/yaml").is_some());
    }

    #[test]
    fn test_accept_encoding() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(registry.accept_encoding_header().as_deref(), Some("gzip, br"));
        assert_eq!(CodecRegistry::new().accept_encoding_header(), None);
    }

    #[test]
    fn test_json_structured_suffix_match() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.codec_for("application/hal+json").is_some());
        assert!(registry.codec_for("application/json; charset=utf-8").is_some());
        assert!(registry.codec_for("application/octet-stream").is_none());
    }

    #[test]
    fn test_decode_fallback_to_raw() {
        let registry = CodecRegistry::with_defaults();

        // Declared JSON but malformed: keep raw bytes instead of failing
        let body = registry.decode(Some("application/json"), b"{not json");
        assert_eq!(body, Body::Raw(b"{not json".to_vec()));

        // Unknown content type with JSON-looking bytes: detection kicks in
        let body = registry.decode(Some("application/unknown"), b"[1, 2]");
        assert_eq!(body, Body::List(vec![Body::Int(1), Body::Int(2)]));
    }

    #[test]
    fn test_decode_empty_is_null() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(registry.decode(Some("application/json"), b""), Body::Null);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let codec = YamlCodec;
        let body = codec.unmarshal(b"items:\n  - 1\n  - 2\n").unwrap();
        assert_eq!(
            body.get("items"),
            Some(&Body::List(vec![Body::Int(1), Body::Int(2)]))
        );

        let bytes = codec.marshal(&body).unwrap();
        assert_eq!(codec.unmarshal(&bytes).unwrap(), body);
    }
}
