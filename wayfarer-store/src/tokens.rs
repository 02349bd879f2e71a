//! Persistent auth-token cache.
//!
//! Auth handlers may stash derived material (access tokens, expiry
//! timestamps) between invocations. Entries are namespaced by
//! `"<api>:<profile>"` so two differently-profiled calls against the same
//! base URL never share state.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StoreError;
use crate::persistence::{self, load_json_or_default, save_json};

/// Keyed string-map store for auth handler state.
pub struct TokenCache {
    path: PathBuf,
    entries: HashMap<String, HashMap<String, String>>,
}

impl TokenCache {
    /// Loads the cache from the given path, starting empty if absent.
    pub async fn load(path: PathBuf) -> Self {
        let entries = load_json_or_default(&path).await;
        Self { path, entries }
    }

    /// Loads the cache from the default location.
    pub async fn load_default() -> Self {
        Self::load(persistence::default_tokens_path()).await
    }

    /// Builds the namespacing key for an API/profile pair.
    pub fn key(api: &str, profile: Option<&str>) -> String {
        format!("{}:{}", api, profile.unwrap_or("default"))
    }

    /// Returns a stored value for the cache key.
    pub fn get(&self, cache_key: &str, field: &str) -> Option<&str> {
        self.entries
            .get(cache_key)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    /// Stores a value under the cache key and persists.
    pub async fn set(
        &mut self,
        cache_key: &str,
        field: &str,
        value: String,
    ) -> Result<(), StoreError> {
        self.entries
            .entry(cache_key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        save_json(&self.path, &self.entries).await
    }

    /// Drops everything stored under the cache key and persists.
    pub async fn forget(&mut self, cache_key: &str) -> Result<(), StoreError> {
        if self.entries.remove(cache_key).is_some() {
            save_json(&self.path, &self.entries).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespacing() {
        assert_eq!(TokenCache::key("github", None), "github:default");
        assert_eq!(TokenCache::key("github", Some("work")), "github:work");
    }

    #[tokio::test]
    async fn test_profiles_never_share_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut cache = TokenCache::load(temp_dir.path().join("tokens.json")).await;

        let work = TokenCache::key("github", Some("work"));
        let home = TokenCache::key("github", Some("home"));
        cache.set(&work, "token", "t-work".to_string()).await.unwrap();

        assert_eq!(cache.get(&work, "token"), Some("t-work"));
        assert_eq!(cache.get(&home, "token"), None);
    }

    #[tokio::test]
    async fn test_persists_across_loads() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("tokens.json");

        let mut cache = TokenCache::load(path.clone()).await;
        cache
            .set("api:default", "token", "abc".to_string())
            .await
            .unwrap();

        let reloaded = TokenCache::load(path).await;
        assert_eq!(reloaded.get("api:default", "token"), Some("abc"));
    }

    #[tokio::test]
    async fn test_forget() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut cache = TokenCache::load(temp_dir.path().join("tokens.json")).await;

        cache
            .set("api:default", "token", "abc".to_string())
            .await
            .unwrap();
        cache.forget("api:default").await.unwrap();
        assert_eq!(cache.get("api:default", "token"), None);
    }
}
