//! Per-API description-document freshness index.
//!
//! A small keyed store recording, per named API, when its cached API
//! description expires. While the timestamp is in the future, callers can
//! skip the description fetch entirely, not even a conditional request.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::persistence::{self, load_json_or_default, save_json};

/// Keyed expiry-timestamp store for API descriptions.
pub struct FreshnessIndex {
    path: PathBuf,
    entries: HashMap<String, DateTime<Utc>>,
}

impl FreshnessIndex {
    /// Loads the index from the given path, starting empty if absent.
    pub async fn load(path: PathBuf) -> Self {
        let entries = load_json_or_default(&path).await;
        Self { path, entries }
    }

    /// Loads the index from the default location.
    pub async fn load_default() -> Self {
        Self::load(persistence::default_freshness_path()).await
    }

    /// Returns true if the named API's description document is still fresh.
    pub fn is_fresh(&self, api: &str) -> bool {
        self.entries
            .get(api)
            .is_some_and(|expiry| Utc::now() < *expiry)
    }

    /// Records a new expiry for the named API and persists the index.
    pub async fn set(&mut self, api: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.entries.insert(api.to_string(), expires_at);
        save_json(&self.path, &self.entries).await
    }

    /// Drops the entry for the named API and persists the index.
    pub async fn forget(&mut self, api: &str) -> Result<(), StoreError> {
        if self.entries.remove(api).is_some() {
            save_json(&self.path, &self.entries).await?;
        }
        Ok(())
    }

    /// Drops every entry and persists the empty index.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        save_json(&self.path, &self.entries).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_freshness_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("spec_expiry.json");

        let mut index = FreshnessIndex::load(path.clone()).await;
        assert!(!index.is_fresh("petstore"));

        index
            .set("petstore", Utc::now() + Duration::hours(24))
            .await
            .unwrap();
        assert!(index.is_fresh("petstore"));

        // A second process sees the persisted state
        let reloaded = FreshnessIndex::load(path).await;
        assert!(reloaded.is_fresh("petstore"));
    }

    #[tokio::test]
    async fn test_expired_and_forgotten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut index = FreshnessIndex::load(temp_dir.path().join("idx.json")).await;

        index
            .set("stale", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert!(!index.is_fresh("stale"));

        index
            .set("fresh", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        index.forget("fresh").await.unwrap();
        assert!(!index.is_fresh("fresh"));
    }
}
