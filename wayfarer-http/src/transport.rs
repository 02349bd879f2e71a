//! Cache-aware transport.
//!
//! One physical exchange: serve from the durable response cache when a
//! fresh entry exists, otherwise perform the live request and store the
//! result. Cache write failures are logged and swallowed — caching is an
//! optimization, never a correctness requirement.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use wayfarer_core::models::response::HEADER_JOIN;
use wayfarer_store::{CacheEntry, ResponseCache};

use crate::enrich::PreparedRequest;
use crate::error::HttpError;

// ============================================================================
// Raw Response
// ============================================================================

/// An undecoded HTTP exchange result.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Protocol version (e.g. `HTTP/1.1`).
    pub proto: String,
    /// Status code.
    pub status: u16,
    /// Headers; multiple values for one name joined with a comma.
    pub headers: BTreeMap<String, String>,
    /// Fully-drained body bytes.
    pub body: Vec<u8>,
    /// True when served from the durable cache without a round trip.
    pub from_cache: bool,
}

impl RawResponse {
    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl From<CacheEntry> for RawResponse {
    fn from(entry: CacheEntry) -> Self {
        Self {
            proto: entry.proto,
            status: entry.status,
            headers: entry.headers,
            body: entry.body,
            from_cache: true,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Cache-aware single-exchange transport.
pub struct Transport {
    client: reqwest::Client,
    cache: Option<Arc<ResponseCache>>,
    no_cache: bool,
    min_ttl: Option<ChronoDuration>,
}

impl Transport {
    /// Creates a transport over the given client and optional cache.
    pub fn new(client: reqwest::Client, cache: Option<Arc<ResponseCache>>) -> Self {
        Self {
            client,
            cache,
            no_cache: false,
            min_ttl: None,
        }
    }

    /// Enables no-cache mode: the store is bypassed for reads and writes,
    /// and any existing entry for the request is invalidated so a forced
    /// refresh corrects a previously-cached mistake.
    pub fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = no_cache;
        self
    }

    /// Sets the minimum freshness floor for responses without cache
    /// directives (used when fetching API description documents).
    pub fn with_min_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.min_ttl = ChronoDuration::from_std(ttl).ok();
        self
    }

    /// Performs one exchange, consulting and updating the cache.
    pub async fn round_trip(&self, request: &PreparedRequest) -> Result<RawResponse, HttpError> {
        let signature = request.signature();
        let cacheable = request.method == Method::GET || request.method == Method::HEAD;

        if let Some(cache) = &self.cache {
            if self.no_cache {
                cache.invalidate(&signature).await;
            } else if cacheable {
                if let Some(entry) = cache.get(&signature).await {
                    return Ok(entry.into());
                }
            }
        }

        debug!(method = %request.method, url = %request.url, "Live exchange");
        let response = self.client.execute(request.to_reqwest()?).await?;

        let proto = format!("{:?}", response.version());
        let status = response.status().as_u16();
        let success = response.status().is_success();

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.to_string())
                .and_modify(|existing| {
                    existing.push_str(HEADER_JOIN);
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        // Even empty bodies (204, HEAD) are fully drained before any cache
        // entry is committed; freshness bookkeeping requires a clean
        // end-of-body.
        let body = response.bytes().await?.to_vec();

        let mut raw = RawResponse {
            proto,
            status,
            headers,
            body,
            from_cache: false,
        };

        if cacheable && success && !self.no_cache {
            if let Some(cache) = &self.cache {
                self.store(cache, &signature, &mut raw).await;
            }
        }

        Ok(raw)
    }

    /// Stores the response if its freshness can be established.
    ///
    /// The minimum-TTL floor applies only when the origin sent neither
    /// `Expires` nor a `max-age` directive; existing directives are
    /// supplemented, never overridden.
    async fn store(&self, cache: &ResponseCache, signature: &str, raw: &mut RawResponse) {
        let now = Utc::now();
        let mut expires_at = freshness_expiry(raw, now);

        if expires_at.is_none() && !has_no_store(raw) {
            if let Some(min_ttl) = self.min_ttl {
                let floor = format!("max-age={}", min_ttl.num_seconds());
                match raw.headers.get_mut("cache-control") {
                    Some(existing) => {
                        existing.push_str(HEADER_JOIN);
                        existing.push_str(&floor);
                    }
                    None => {
                        raw.headers.insert("cache-control".to_string(), floor);
                    }
                }
                expires_at = Some(now + min_ttl);
            }
        }

        let Some(expires_at) = expires_at else {
            return;
        };

        let entry = CacheEntry {
            signature: signature.to_string(),
            proto: raw.proto.clone(),
            status: raw.status,
            headers: raw.headers.clone(),
            body: raw.body.clone(),
            stored_at: now,
            expires_at,
        };

        if let Err(e) = cache.put(&entry).await {
            warn!(signature, error = %e, "Cache write failed");
        }
    }
}

/// Computes the expiry the origin's own directives establish, if any.
fn freshness_expiry(raw: &RawResponse, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if has_no_store(raw) {
        return None;
    }

    if let Some(max_age) = raw.header("cache-control").and_then(parse_max_age) {
        return Some(now + ChronoDuration::seconds(max_age));
    }

    if let Some(expires) = raw.header("expires") {
        if let Ok(when) = DateTime::parse_from_rfc2822(expires) {
            return Some(when.with_timezone(&Utc));
        }
    }

    None
}

/// Returns true if the origin forbids storing this response.
fn has_no_store(raw: &RawResponse) -> bool {
    raw.header("cache-control").is_some_and(|cc| {
        cc.split(',')
            .any(|d| matches!(d.trim(), "no-store" | "no-cache"))
    })
}

/// Extracts the `max-age` value from a `Cache-Control` header.
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|v| v.parse().ok())
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(cache_control: Option<&str>, expires: Option<&str>) -> RawResponse {
        let mut headers = BTreeMap::new();
        if let Some(cc) = cache_control {
            headers.insert("cache-control".to_string(), cc.to_string());
        }
        if let Some(exp) = expires {
            headers.insert("expires".to_string(), exp.to_string());
        }
        RawResponse {
            proto: "HTTP/1.1".to_string(),
            status: 200,
            headers,
            body: Vec::new(),
            from_cache: false,
        }
    }

    #[test]
    fn test_max_age_establishes_expiry() {
        let now = Utc::now();
        let raw = raw_with(Some("public, max-age=600"), None);
        let expiry = freshness_expiry(&raw, now).unwrap();
        assert_eq!(expiry, now + ChronoDuration::seconds(600));
    }

    #[test]
    fn test_expires_header_parsed() {
        let raw = raw_with(None, Some("Wed, 21 Oct 2065 07:28:00 GMT"));
        assert!(freshness_expiry(&raw, Utc::now()).is_some());
    }

    #[test]
    fn test_no_store_never_cached() {
        let raw = raw_with(Some("no-store, max-age=600"), None);
        assert!(freshness_expiry(&raw, Utc::now()).is_none());
        assert!(has_no_store(&raw));
    }

    #[test]
    fn test_no_directives_no_expiry() {
        let raw = raw_with(None, None);
        assert!(freshness_expiry(&raw, Utc::now()).is_none());
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("max-age=60"), Some(60));
        assert_eq!(parse_max_age("private, max-age=3600"), Some(3600));
        assert_eq!(parse_max_age("private"), None);
    }
}
