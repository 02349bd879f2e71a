//! Durable response cache keyed by request signature.
//!
//! Each entry lives in its own file under the cache directory, named by the
//! SHA-256 digest of the canonical request signature. Entries carry a
//! freshness expiry; an entry is served without a network round trip only
//! while `now < expires_at`. Cache write failures are never fatal to the
//! caller — caching is an optimization, not a correctness requirement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{self, ensure_dir, load_json, save_json};

// ============================================================================
// Cache Entry
// ============================================================================

/// One stored response with freshness metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical request signature this entry was stored under.
    pub signature: String,
    /// Protocol version of the stored response.
    pub proto: String,
    /// HTTP status of the stored response.
    pub status: u16,
    /// Stored response headers.
    pub headers: BTreeMap<String, String>,
    /// Raw response body bytes.
    #[serde(with = "body_bytes")]
    pub body: Vec<u8>,
    /// When the entry was stored.
    pub stored_at: DateTime<Utc>,
    /// When the entry stops being servable without a round trip.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Returns true if the entry may still be served from cache.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Base64 body encoding so cache files stay valid JSON.
mod body_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Response Cache
// ============================================================================

/// Per-entry durable store for cacheable responses.
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Creates a cache rooted at the given directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Creates a cache at the default location.
    pub fn at_default_location() -> Self {
        Self::new(persistence::default_responses_dir())
    }

    /// Returns the file path for a signature.
    fn path_for(&self, signature: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest_hex(signature)))
    }

    /// Looks up a fresh entry for the signature.
    ///
    /// Expired or unreadable entries behave as a miss.
    pub async fn get(&self, signature: &str) -> Option<CacheEntry> {
        let path = self.path_for(signature);
        let entry: CacheEntry = load_json(&path).await.ok()?;

        if entry.is_fresh(Utc::now()) {
            debug!(signature, "Cache hit");
            Some(entry)
        } else {
            debug!(signature, "Cache entry expired");
            None
        }
    }

    /// Stores an entry.
    pub async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        ensure_dir(&self.dir).await?;
        save_json(&self.path_for(&entry.signature), entry).await?;
        debug!(signature = %entry.signature, expires_at = %entry.expires_at, "Cached response");
        Ok(())
    }

    /// Removes any entry for the signature.
    ///
    /// Used by the no-cache mode so a forced refresh corrects a
    /// previously-cached mistake instead of being ignored once.
    pub async fn invalidate(&self, signature: &str) {
        let path = self.path_for(signature);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(signature, "Invalidated cache entry"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(signature, error = %e, "Failed to invalidate cache entry"),
        }
    }

    /// Removes every entry in the cache directory.
    pub async fn clear(&self) -> Result<(), StoreError> {
        if !self.dir.exists() {
            return Ok(());
        }
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        debug!(dir = %self.dir.display(), "Cleared response cache");
        Ok(())
    }
}

/// Hex SHA-256 digest of a signature string.
fn digest_hex(signature: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, signature.as_bytes());
    digest
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(signature: &str, ttl_secs: i64) -> CacheEntry {
        let now = Utc::now();
        CacheEntry {
            signature: signature.to_string(),
            proto: "HTTP/1.1".to_string(),
            status: 200,
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body: br#"{"ok": true}"#.to_vec(),
            stored_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(temp_dir.path().to_path_buf());

        let stored = entry("GET https://example.com/a", 60);
        cache.put(&stored).await.unwrap();

        let loaded = cache.get("GET https://example.com/a").await.unwrap();
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(temp_dir.path().to_path_buf());

        cache.put(&entry("GET https://example.com/b", -1)).await.unwrap();
        assert!(cache.get("GET https://example.com/b").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(temp_dir.path().to_path_buf());

        cache.put(&entry("GET https://example.com/c", 60)).await.unwrap();
        cache.invalidate("GET https://example.com/c").await;
        assert!(cache.get("GET https://example.com/c").await.is_none());

        // Invalidating a missing entry is fine
        cache.invalidate("GET https://example.com/missing").await;
    }

    #[tokio::test]
    async fn test_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(temp_dir.path().to_path_buf());

        cache.put(&entry("GET https://example.com/1", 60)).await.unwrap();
        cache.put(&entry("GET https://example.com/2", 60)).await.unwrap();
        cache.clear().await.unwrap();

        assert!(cache.get("GET https://example.com/1").await.is_none());
        assert!(cache.get("GET https://example.com/2").await.is_none());
    }

    #[test]
    fn test_distinct_signatures_distinct_files() {
        let cache = ResponseCache::new(PathBuf::from("/tmp/x"));
        assert_ne!(
            cache.path_for("GET https://example.com/a"),
            cache.path_for("GET https://example.com/b")
        );
    }
}
