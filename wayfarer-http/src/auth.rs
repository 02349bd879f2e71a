//! Auth scheme registry and built-in handlers.
//!
//! An auth handler mutates an outgoing request given stored credentials.
//! Handlers are registered under scheme names in an explicit registry value;
//! registering a second handler under the same name replaces the first
//! (last registration wins). Injection failure is fatal for the request —
//! no partially-authenticated request is ever sent.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use wayfarer_core::AuthDescriptor;
use wayfarer_store::TokenCache;

use crate::enrich::PreparedRequest;
use crate::error::HttpError;

// ============================================================================
// Auth Handler Trait
// ============================================================================

/// A declared parameter of an auth scheme.
#[derive(Debug, Clone, Copy)]
pub struct AuthParam {
    /// Parameter name.
    pub name: &'static str,
    /// Whether the parameter must be present.
    pub required: bool,
    /// One-line description for interactive configuration.
    pub help: &'static str,
}

/// One auth scheme implementation.
///
/// `cache_key` is the `"<api>:<profile>"` namespace for any state the
/// handler keeps in the token cache between invocations.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    /// Scheme name this handler registers under.
    fn scheme(&self) -> &'static str;

    /// Declared parameters for this scheme.
    fn params(&self) -> &'static [AuthParam];

    /// Mutates the outgoing request with credentials.
    async fn on_request(
        &self,
        request: &mut PreparedRequest,
        cache_key: &str,
        params: &HashMap<String, String>,
        tokens: &mut TokenCache,
    ) -> Result<(), HttpError>;
}

/// Returns a required parameter value or an auth error naming it.
fn required<'a>(
    params: &'a HashMap<String, String>,
    scheme: &str,
    name: &str,
) -> Result<&'a str, HttpError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| HttpError::Auth(format!("{scheme}: missing required parameter {name}")))
}

// ============================================================================
// Built-in Handlers
// ============================================================================

/// HTTP basic auth: `Authorization: Basic base64(username:password)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicAuth;

#[async_trait]
impl AuthHandler for BasicAuth {
    fn scheme(&self) -> &'static str {
        "basic"
    }

    fn params(&self) -> &'static [AuthParam] {
        &[
            AuthParam {
                name: "username",
                required: true,
                help: "User name",
            },
            AuthParam {
                name: "password",
                required: false,
                help: "Password",
            },
        ]
    }

    async fn on_request(
        &self,
        request: &mut PreparedRequest,
        _cache_key: &str,
        params: &HashMap<String, String>,
        _tokens: &mut TokenCache,
    ) -> Result<(), HttpError> {
        let username = required(params, self.scheme(), "username")?;
        let password = params.get("password").map(String::as_str).unwrap_or("");
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        request.set_header("Authorization", format!("Basic {encoded}"));
        Ok(())
    }
}

/// Static bearer token: `Authorization: Bearer <token>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerAuth;

#[async_trait]
impl AuthHandler for BearerAuth {
    fn scheme(&self) -> &'static str {
        "bearer"
    }

    fn params(&self) -> &'static [AuthParam] {
        &[AuthParam {
            name: "token",
            required: true,
            help: "Bearer token",
        }]
    }

    async fn on_request(
        &self,
        request: &mut PreparedRequest,
        _cache_key: &str,
        params: &HashMap<String, String>,
        _tokens: &mut TokenCache,
    ) -> Result<(), HttpError> {
        let token = required(params, self.scheme(), "token")?;
        request.set_header("Authorization", format!("Bearer {token}"));
        Ok(())
    }
}

/// API key in a configurable header (default `X-Api-Key`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiKeyAuth;

#[async_trait]
impl AuthHandler for ApiKeyAuth {
    fn scheme(&self) -> &'static str {
        "api-key"
    }

    fn params(&self) -> &'static [AuthParam] {
        &[
            AuthParam {
                name: "key",
                required: true,
                help: "API key value",
            },
            AuthParam {
                name: "header",
                required: false,
                help: "Header name (default X-Api-Key)",
            },
        ]
    }

    async fn on_request(
        &self,
        request: &mut PreparedRequest,
        _cache_key: &str,
        params: &HashMap<String, String>,
        _tokens: &mut TokenCache,
    ) -> Result<(), HttpError> {
        let key = required(params, self.scheme(), "key")?;
        let header = params
            .get("header")
            .map(String::as_str)
            .unwrap_or("X-Api-Key");
        request.set_header(header, key.to_string());
        Ok(())
    }
}

// ============================================================================
// Auth Registry
// ============================================================================

/// Registry of auth handlers by scheme name.
///
/// An explicit value passed into the enricher; there is no ambient global
/// scheme table.
pub struct AuthRegistry {
    handlers: HashMap<String, Arc<dyn AuthHandler>>,
}

impl AuthRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BasicAuth));
        registry.register(Arc::new(BearerAuth));
        registry.register(Arc::new(ApiKeyAuth));
        registry
    }

    /// Registers a handler under its scheme name; last registration wins.
    pub fn register(&mut self, handler: Arc<dyn AuthHandler>) {
        debug!(scheme = handler.scheme(), "Registering auth handler");
        self.handlers.insert(handler.scheme().to_string(), handler);
    }

    /// Looks up a handler by scheme name.
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn AuthHandler>> {
        self.handlers.get(scheme)
    }

    /// Applies the descriptor's scheme to the request.
    ///
    /// Validates declared required parameters before invoking the handler.
    pub async fn inject(
        &self,
        descriptor: &AuthDescriptor,
        request: &mut PreparedRequest,
        cache_key: &str,
        tokens: &mut TokenCache,
    ) -> Result<(), HttpError> {
        let handler = self
            .get(&descriptor.name)
            .ok_or_else(|| HttpError::Auth(format!("unknown auth scheme: {}", descriptor.name)))?;

        for param in handler.params() {
            if param.required && !descriptor.params.contains_key(param.name) {
                return Err(HttpError::Auth(format!(
                    "{}: missing required parameter {}",
                    descriptor.name, param.name
                )));
            }
        }

        handler
            .on_request(request, cache_key, &descriptor.params, tokens)
            .await
    }
}

impl Default for AuthRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for AuthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRegistry")
            .field("schemes", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use url::Url;

    async fn tokens() -> (tempfile::TempDir, TokenCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::load(dir.path().join("tokens.json")).await;
        (dir, cache)
    }

    fn request() -> PreparedRequest {
        PreparedRequest::new(Method::GET, Url::parse("https://example.com/").unwrap())
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let (_dir, mut tokens) = tokens().await;
        let mut req = request();
        let descriptor = AuthDescriptor {
            name: "basic".to_string(),
            params: HashMap::from([
                ("username".to_string(), "user".to_string()),
                ("password".to_string(), "pass".to_string()),
            ]),
        };

        AuthRegistry::with_defaults()
            .inject(&descriptor, &mut req, "api:default", &mut tokens)
            .await
            .unwrap();

        // base64("user:pass")
        assert_eq!(req.header("authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[tokio::test]
    async fn test_missing_required_param_fails_before_send() {
        let (_dir, mut tokens) = tokens().await;
        let mut req = request();
        let descriptor = AuthDescriptor {
            name: "bearer".to_string(),
            params: HashMap::new(),
        };

        let result = AuthRegistry::with_defaults()
            .inject(&descriptor, &mut req, "api:default", &mut tokens)
            .await;

        assert!(matches!(result, Err(HttpError::Auth(_))));
        assert_eq!(req.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_api_key_custom_header() {
        let (_dir, mut tokens) = tokens().await;
        let mut req = request();
        let descriptor = AuthDescriptor {
            name: "api-key".to_string(),
            params: HashMap::from([
                ("key".to_string(), "k-123".to_string()),
                ("header".to_string(), "X-Custom-Key".to_string()),
            ]),
        };

        AuthRegistry::with_defaults()
            .inject(&descriptor, &mut req, "api:default", &mut tokens)
            .await
            .unwrap();
        assert_eq!(req.header("x-custom-key"), Some("k-123"));
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        struct LoudBearer;

        #[async_trait]
        impl AuthHandler for LoudBearer {
            fn scheme(&self) -> &'static str {
                "bearer"
            }

            fn params(&self) -> &'static [AuthParam] {
                &[]
            }

            async fn on_request(
                &self,
                request: &mut PreparedRequest,
                _cache_key: &str,
                _params: &HashMap<String, String>,
                _tokens: &mut TokenCache,
            ) -> Result<(), HttpError> {
                request.set_header("Authorization", "Bearer LOUD");
                Ok(())
            }
        }

        let mut registry = AuthRegistry::with_defaults();
        registry.register(Arc::new(LoudBearer));

        let (_dir, mut tokens) = tokens().await;
        let mut req = request();
        registry
            .inject(
                &AuthDescriptor {
                    name: "bearer".to_string(),
                    params: HashMap::new(),
                },
                &mut req,
                "api:default",
                &mut tokens,
            )
            .await
            .unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer LOUD"));
    }
}
