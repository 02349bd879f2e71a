//! High-level API client.
//!
//! [`ApiClient`] ties the whole request path together: enrichment, retry,
//! the cache-aware transport, body decoding, link extraction, and
//! transparent pagination. Construction goes through [`ApiClientBuilder`];
//! the underlying HTTP client (and any hardware-token identity it needs)
//! is assembled lazily on the first request.

use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;
use url::Url;
use wayfarer_core::models::response::Response;
use wayfarer_core::{ApiProfile, CodecRegistry, TlsConfig};
use wayfarer_links::LinkResolver;
use wayfarer_store::{ResponseCache, TokenCache};

use crate::auth::AuthRegistry;
use crate::enrich::{Overrides, PreparedRequest, RequestEnricher};
use crate::error::HttpError;
use crate::paginate::{PageFetcher, Paginator};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::tls::{build_client, EnvPinSource, HardwareIdentity, PinSource};
use crate::transport::{RawResponse, Transport};

// ============================================================================
// Builder
// ============================================================================

/// Configures and builds an [`ApiClient`].
pub struct ApiClientBuilder {
    base: Url,
    profile: Option<ApiProfile>,
    overrides: Overrides,
    tls: TlsConfig,
    pin_source: Arc<dyn PinSource>,
    codecs: CodecRegistry,
    links: LinkResolver,
    auth: AuthRegistry,
    cache: Option<Arc<ResponseCache>>,
    no_cache: bool,
    min_ttl: Option<Duration>,
    retry: RetryPolicy,
    paginate: bool,
    fail_on_status: bool,
    tokens: Option<TokenCache>,
    token_key: String,
}

impl ApiClientBuilder {
    /// Starts a builder for the given base URL.
    pub fn new(base: Url) -> Self {
        Self {
            base,
            profile: None,
            overrides: Overrides::default(),
            tls: TlsConfig::default(),
            pin_source: Arc::new(EnvPinSource),
            codecs: CodecRegistry::with_defaults(),
            links: LinkResolver::new(),
            auth: AuthRegistry::with_defaults(),
            cache: None,
            no_cache: false,
            min_ttl: None,
            retry: RetryPolicy::default(),
            paginate: true,
            fail_on_status: false,
            tokens: None,
            token_key: TokenCache::key("default", None),
        }
    }

    /// Sets the profile whose defaults and auth apply to every request.
    pub fn profile(mut self, profile: ApiProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Sets per-invocation header and query overrides.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Sets the merged TLS configuration.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Replaces the PIN source for hardware-token identities.
    pub fn pin_source(mut self, source: Arc<dyn PinSource>) -> Self {
        self.pin_source = source;
        self
    }

    /// Replaces the codec registry.
    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Replaces the link resolver.
    pub fn links(mut self, links: LinkResolver) -> Self {
        self.links = links;
        self
    }

    /// Replaces the auth registry.
    pub fn auth(mut self, auth: AuthRegistry) -> Self {
        self.auth = auth;
        self
    }

    /// Attaches a durable response cache.
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bypasses and invalidates the cache for this invocation.
    pub fn no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Sets the minimum freshness floor for directive-less responses.
    pub fn min_ttl(mut self, ttl: Duration) -> Self {
        self.min_ttl = Some(ttl);
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables or disables transparent pagination.
    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Turns HTTP error statuses into [`HttpError::Status`].
    pub fn fail_on_status(mut self, fail: bool) -> Self {
        self.fail_on_status = fail;
        self
    }

    /// Attaches the persistent token cache under the given key
    /// (see [`TokenCache::key`]).
    pub fn tokens(mut self, tokens: TokenCache, key: String) -> Self {
        self.tokens = Some(tokens);
        self.token_key = key;
        self
    }

    /// Builds the client. No network or TLS material is touched yet.
    pub async fn build(self) -> ApiClient {
        let hardware = self
            .tls
            .hardware_token
            .clone()
            .map(|config| HardwareIdentity::new(config, Arc::clone(&self.pin_source)));

        let tokens = match self.tokens {
            Some(tokens) => tokens,
            None => TokenCache::load_default().await,
        };

        let accept = self.codecs.accept_header();
        let accept_encoding = self.codecs.accept_encoding_header();

        ApiClient {
            enricher: RequestEnricher::new(
                self.base,
                self.profile,
                self.overrides,
                accept,
                accept_encoding,
            ),
            tls: self.tls,
            hardware,
            codecs: self.codecs,
            links: self.links,
            auth: self.auth,
            cache: self.cache,
            no_cache: self.no_cache,
            min_ttl: self.min_ttl,
            transport: OnceCell::new(),
            executor: RetryExecutor::new(self.retry),
            paginator: Paginator::new(self.paginate),
            fail_on_status: self.fail_on_status,
            tokens: Mutex::new(tokens),
            token_key: self.token_key,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// A configured client for one API.
pub struct ApiClient {
    enricher: RequestEnricher,
    tls: TlsConfig,
    hardware: Option<HardwareIdentity>,
    codecs: CodecRegistry,
    links: LinkResolver,
    auth: AuthRegistry,
    cache: Option<Arc<ResponseCache>>,
    no_cache: bool,
    min_ttl: Option<Duration>,
    transport: OnceCell<Transport>,
    executor: RetryExecutor,
    paginator: Paginator,
    fail_on_status: bool,
    tokens: Mutex<TokenCache>,
    token_key: String,
}

impl ApiClient {
    /// Starts a builder.
    pub fn builder(base: Url) -> ApiClientBuilder {
        ApiClientBuilder::new(base)
    }

    /// The codec registry, for callers that need to marshal bodies.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Performs one request: enrich, execute with retries, decode, and
    /// extract links. Pagination is not applied here.
    pub async fn request(
        &self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response, HttpError> {
        let prepared = {
            let mut tokens = self.tokens.lock().await;
            self.enricher
                .enrich(method, target, body, &self.auth, &mut tokens, &self.token_key)
                .await?
        };

        let raw = self.execute(&prepared).await?;
        let response = self.decode(&prepared, raw)?;

        if self.fail_on_status && !response.is_success() && response.status >= 400 {
            return Err(HttpError::Status(response.status));
        }

        Ok(response)
    }

    /// Looks up a cached response for the target without performing any
    /// network exchange or building the TLS client.
    ///
    /// A missing or expired entry, an unattached cache, and no-cache mode
    /// all return `Ok(None)`.
    pub async fn cached(
        &self,
        method: Method,
        target: &str,
    ) -> Result<Option<Response>, HttpError> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        if self.no_cache {
            return Ok(None);
        }

        let prepared = {
            let mut tokens = self.tokens.lock().await;
            self.enricher
                .enrich(method, target, None, &self.auth, &mut tokens, &self.token_key)
                .await?
        };

        match cache.get(&prepared.signature()).await {
            Some(entry) => {
                let response = self.decode(&prepared, RawResponse::from(entry))?;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }

    /// Performs a GET and transparently merges any paginated chain.
    pub async fn get_parsed(&self, target: &str) -> Result<Response, HttpError> {
        let first = self.request(Method::GET, target, None).await?;
        self.paginator.follow(first, self).await
    }

    /// Executes through the lazily-built transport.
    async fn execute(&self, prepared: &PreparedRequest) -> Result<RawResponse, HttpError> {
        let transport = self
            .transport
            .get_or_try_init(|| async {
                let client = build_client(&self.tls, self.hardware.as_ref())?;
                let mut transport = Transport::new(client, self.cache.clone())
                    .with_no_cache(self.no_cache);
                if let Some(ttl) = self.min_ttl {
                    transport = transport.with_min_ttl(ttl);
                }
                Ok::<_, HttpError>(transport)
            })
            .await?;

        self.executor.execute(transport, prepared).await
    }

    /// Decodes a raw exchange into a [`Response`] with extracted links.
    fn decode(&self, prepared: &PreparedRequest, raw: RawResponse) -> Result<Response, HttpError> {
        let content_type = raw.header("content-type").map(str::to_owned);
        debug!(
            status = raw.status,
            content_type = content_type.as_deref().unwrap_or("-"),
            from_cache = raw.from_cache,
            "Decoding response"
        );

        let mut response = Response {
            proto: raw.proto,
            status: raw.status,
            headers: raw.headers,
            links: Default::default(),
            body: self.codecs.decode(content_type.as_deref(), &raw.body),
        };

        self.links.parse_links(&prepared.url, &mut response)?;
        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for ApiClient {
    async fn fetch_page(&self, uri: &str) -> Result<Response, HttpError> {
        self.request(Method::GET, uri, None).await
    }
}
