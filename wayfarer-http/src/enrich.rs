//! Request enrichment.
//!
//! Turns a logical target (method + URI + optional body) into a fully-formed
//! outgoing request by layering profile defaults, CLI-level overrides,
//! content negotiation, and auth injection.
//!
//! Header/query precedence, low to high: profile defaults → CLI-level
//! overrides → auth-injected values. Lower-precedence values are added only
//! when the name is not already set by a higher layer.

use reqwest::Method;
use std::collections::HashSet;
use tracing::debug;
use url::Url;
use wayfarer_core::ApiProfile;
use wayfarer_store::TokenCache;

use crate::auth::AuthRegistry;
use crate::error::HttpError;

/// Default content type when a body is present and none was set.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Headers that participate in the request signature.
const SIGNATURE_HEADERS: [&str; 2] = ["accept", "authorization"];

// ============================================================================
// Prepared Request
// ============================================================================

/// A fully-formed outgoing request.
///
/// The body is buffered so the retry executor can replay an identical
/// request on every attempt.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully-resolved URL, query included.
    pub url: Url,
    /// Ordered header list; names are matched case-insensitively.
    pub headers: Vec<(String, String)>,
    /// Buffered request body.
    pub body: Option<Vec<u8>>,
}

impl PreparedRequest {
    /// Creates a bare request with no headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Returns the first value of a header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value of the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }

    /// Adds a header only if no value of the same name is set.
    pub fn add_header_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if self.header(name).is_none() {
            self.headers.push((name.to_string(), value.into()));
        }
    }

    /// Computes the canonical request signature used as the cache key.
    ///
    /// Method + fully-resolved URL + the relevant header set. Recomputed per
    /// attempt, never mutated.
    pub fn signature(&self) -> String {
        let mut sig = format!("{} {}", self.method, self.url);
        for name in SIGNATURE_HEADERS {
            if let Some(value) = self.header(name) {
                sig.push('\n');
                sig.push_str(name);
                sig.push_str(": ");
                sig.push_str(value);
            }
        }
        sig
    }

    /// Converts into a `reqwest` request.
    pub fn to_reqwest(&self) -> Result<reqwest::Request, HttpError> {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());

        for (name, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
            request.headers_mut().append(name, value);
        }

        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }

        Ok(request)
    }
}

// ============================================================================
// Request Enricher
// ============================================================================

/// Per-invocation CLI-level overrides.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Extra headers (`-H name:value`).
    pub headers: Vec<(String, String)>,
    /// Extra query parameters (`-q name=value`).
    pub query: Vec<(String, String)>,
}

/// Assembles outgoing requests from a base URL, profile defaults, CLI
/// overrides, negotiated accept headers, and auth injection.
pub struct RequestEnricher {
    base: Url,
    profile: Option<ApiProfile>,
    overrides: Overrides,
    accept: String,
    accept_encoding: Option<String>,
}

impl RequestEnricher {
    /// Creates an enricher.
    ///
    /// `accept` and `accept_encoding` come from the codec registry's
    /// declared priorities and decompression capabilities.
    pub fn new(
        base: Url,
        profile: Option<ApiProfile>,
        overrides: Overrides,
        accept: String,
        accept_encoding: Option<String>,
    ) -> Self {
        Self {
            base,
            profile,
            overrides,
            accept,
            accept_encoding,
        }
    }

    /// Produces a fully-formed request for the logical target.
    ///
    /// Auth injection failure is fatal: no partially-authenticated request
    /// is ever returned.
    pub async fn enrich(
        &self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
        auth: &AuthRegistry,
        tokens: &mut TokenCache,
        cache_key: &str,
    ) -> Result<PreparedRequest, HttpError> {
        let url = self.resolve_target(target)?;
        let mut request = PreparedRequest::new(method, url);
        request.body = body;

        self.apply_query(&mut request);
        self.apply_headers(&mut request);

        if request.body.is_some() && request.header("content-type").is_none() {
            request.set_header("Content-Type", DEFAULT_CONTENT_TYPE);
        }

        if let Some(descriptor) = self.profile.as_ref().and_then(|p| p.auth.as_ref()) {
            auth.inject(descriptor, &mut request, cache_key, tokens)
                .await?;
        }

        debug!(method = %request.method, url = %request.url, "Enriched request");
        Ok(request)
    }

    /// Resolves a possibly-relative target against the base URL.
    ///
    /// A base path like `/v1` acts as a prefix, so joining happens against
    /// `/v1/`; without the normalization `join` would replace the last
    /// segment and route `users` to `/users`.
    fn resolve_target(&self, target: &str) -> Result<Url, HttpError> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if self.base.path().ends_with('/') {
                    Ok(self.base.join(target)?)
                } else {
                    let mut base = self.base.clone();
                    base.set_path(&format!("{}/", base.path()));
                    Ok(base.join(target)?)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Applies query parameters: target-inline > CLI overrides > profile
    /// defaults, deduplicated by name.
    fn apply_query(&self, request: &mut PreparedRequest) {
        let mut present: HashSet<String> = request
            .url
            .query_pairs()
            .map(|(k, _)| k.into_owned())
            .collect();

        for (name, value) in &self.overrides.query {
            if present.insert(name.clone()) {
                request.url.query_pairs_mut().append_pair(name, value);
            }
        }

        if let Some(profile) = &self.profile {
            for (name, value) in &profile.query {
                if present.insert(name.clone()) {
                    request.url.query_pairs_mut().append_pair(name, value);
                }
            }
        }
    }

    /// Applies headers: CLI overrides first, then profile defaults where
    /// absent, then negotiated accept headers where absent.
    fn apply_headers(&self, request: &mut PreparedRequest) {
        for (name, value) in &self.overrides.headers {
            request.headers.push((name.clone(), value.clone()));
        }

        if let Some(profile) = &self.profile {
            for (name, value) in &profile.headers {
                request.add_header_if_absent(name, value.clone());
            }
        }

        request.add_header_if_absent("Accept", self.accept.clone());
        if let Some(encoding) = &self.accept_encoding {
            request.add_header_if_absent("Accept-Encoding", encoding.clone());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn enricher(profile: Option<ApiProfile>, overrides: Overrides) -> RequestEnricher {
        RequestEnricher::new(
            Url::parse("https://api.example.com/").unwrap(),
            profile,
            overrides,
            "application/json, */*".to_string(),
            Some("gzip, br".to_string()),
        )
    }

    async fn enrich(
        e: &RequestEnricher,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
    ) -> PreparedRequest {
        let temp = tempfile::tempdir().unwrap();
        let mut tokens = TokenCache::load(temp.path().join("tokens.json")).await;
        e.enrich(method, target, body, &AuthRegistry::new(), &mut tokens, "t:default")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_relative_target_joined_to_base() {
        let e = enricher(None, Overrides::default());
        let req = enrich(&e, Method::GET, "users/42", None).await;
        assert_eq!(req.url.as_str(), "https://api.example.com/users/42");
    }

    #[tokio::test]
    async fn test_base_path_prefix_preserved() {
        let e = RequestEnricher::new(
            Url::parse("https://api.example.com/v1").unwrap(),
            None,
            Overrides::default(),
            "application/json, */*".to_string(),
            None,
        );

        let req = enrich(&e, Method::GET, "users", None).await;
        assert_eq!(req.url.as_str(), "https://api.example.com/v1/users");

        // A leading slash still escapes the prefix deliberately
        let req = enrich(&e, Method::GET, "/health", None).await;
        assert_eq!(req.url.as_str(), "https://api.example.com/health");
    }

    #[tokio::test]
    async fn test_cli_override_beats_profile_default() {
        let profile = ApiProfile {
            headers: HashMap::from([("X-Env".to_string(), "prod".to_string())]),
            query: HashMap::from([("limit".to_string(), "10".to_string())]),
            ..ApiProfile::default()
        };
        let overrides = Overrides {
            headers: vec![("X-Env".to_string(), "staging".to_string())],
            query: vec![("limit".to_string(), "50".to_string())],
        };

        let e = enricher(Some(profile), overrides);
        let req = enrich(&e, Method::GET, "items", None).await;

        // Same-name profile values are skipped, never duplicated
        let envs: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k == "X-Env")
            .collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].1, "staging");
        assert_eq!(req.url.query(), Some("limit=50"));
    }

    #[tokio::test]
    async fn test_profile_defaults_added_when_not_overridden() {
        let profile = ApiProfile {
            headers: HashMap::from([("X-Team".to_string(), "core".to_string())]),
            query: HashMap::from([("page_size".to_string(), "25".to_string())]),
            ..ApiProfile::default()
        };
        let e = enricher(Some(profile), Overrides::default());
        let req = enrich(&e, Method::GET, "items", None).await;

        assert_eq!(req.header("x-team"), Some("core"));
        assert_eq!(req.url.query(), Some("page_size=25"));
    }

    #[tokio::test]
    async fn test_negotiated_headers_set_when_absent() {
        let e = enricher(None, Overrides::default());
        let req = enrich(&e, Method::GET, "items", None).await;

        assert_eq!(req.header("accept"), Some("application/json, */*"));
        assert_eq!(req.header("accept-encoding"), Some("gzip, br"));

        // An explicit Accept override wins
        let e = enricher(
            None,
            Overrides {
                headers: vec![("Accept".to_string(), "text/plain".to_string())],
                query: vec![],
            },
        );
        let req = enrich(&e, Method::GET, "items", None).await;
        assert_eq!(req.header("accept"), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_default_content_type_for_bodies() {
        let e = enricher(None, Overrides::default());
        let req = enrich(&e, Method::POST, "items", Some(b"{}".to_vec())).await;
        assert_eq!(req.header("content-type"), Some(DEFAULT_CONTENT_TYPE));

        let req = enrich(&e, Method::GET, "items", None).await;
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn test_signature_includes_relevant_headers() {
        let mut req = PreparedRequest::new(
            Method::GET,
            Url::parse("https://api.example.com/items").unwrap(),
        );
        let bare = req.signature();

        req.set_header("Accept", "application/json");
        req.set_header("X-Trace", "ignored");
        let signed = req.signature();

        assert_ne!(bare, signed);
        assert!(signed.contains("accept: application/json"));
        assert!(!signed.contains("X-Trace"));
    }

    #[tokio::test]
    async fn test_unknown_auth_scheme_is_fatal() {
        let profile = ApiProfile {
            auth: Some(wayfarer_core::AuthDescriptor {
                name: "nonexistent".to_string(),
                params: HashMap::new(),
            }),
            ..ApiProfile::default()
        };
        let e = enricher(Some(profile), Overrides::default());

        let temp = tempfile::tempdir().unwrap();
        let mut tokens = TokenCache::load(temp.path().join("tokens.json")).await;
        let result = e
            .enrich(
                Method::GET,
                "items",
                None,
                &AuthRegistry::new(),
                &mut tokens,
                "t:default",
            )
            .await;
        assert!(matches!(result, Err(HttpError::Auth(_))));
    }
}
