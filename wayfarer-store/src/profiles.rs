//! Named-API configuration store.
//!
//! Holds every configured API (base URI, profiles, TLS material) in one
//! JSON document in the config directory. Loaded once per process start;
//! saves go through the atomic persistence helpers.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use wayfarer_core::{ApiConfig, ApiProfile};

use crate::error::StoreError;
use crate::persistence::{self, load_json_or_default, save_json};

/// The set of configured APIs.
pub struct ApiStore {
    path: PathBuf,
    apis: HashMap<String, ApiConfig>,
}

impl ApiStore {
    /// Loads the store from the given path, starting empty if absent.
    pub async fn load(path: PathBuf) -> Self {
        let apis = load_json_or_default(&path).await;
        Self { path, apis }
    }

    /// Loads the store from the default location.
    pub async fn load_default() -> Self {
        Self::load(persistence::default_apis_path()).await
    }

    /// Returns the configuration for a named API.
    pub fn get(&self, name: &str) -> Result<&ApiConfig, StoreError> {
        self.apis
            .get(name)
            .ok_or_else(|| StoreError::UnknownApi(name.to_string()))
    }

    /// Returns a profile of a named API, erroring if either is unknown.
    ///
    /// `None` selects the `default` profile; a missing `default` profile is
    /// not an error (the API's own settings apply unchanged).
    pub fn profile(&self, api: &str, name: Option<&str>) -> Result<Option<&ApiProfile>, StoreError> {
        let config = self.get(api)?;
        match config.profile(name) {
            Some(profile) => Ok(Some(profile)),
            None if name.is_none() => Ok(None),
            None => Err(StoreError::UnknownProfile {
                api: api.to_string(),
                profile: name.unwrap_or("default").to_string(),
            }),
        }
    }

    /// Inserts or replaces a named API and persists the store.
    pub async fn set(&mut self, name: &str, config: ApiConfig) -> Result<(), StoreError> {
        self.apis.insert(name.to_string(), config);
        save_json(&self.path, &self.apis).await?;
        info!(api = name, "Saved API configuration");
        Ok(())
    }

    /// Removes a named API and persists the store.
    pub async fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        if self.apis.remove(name).is_some() {
            save_json(&self.path, &self.apis).await?;
        }
        Ok(())
    }

    /// Returns all API names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.apis.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_api() -> ApiConfig {
        let mut config = ApiConfig {
            base: "https://api.example.com".to_string(),
            ..ApiConfig::default()
        };
        config.profiles.insert(
            "default".to_string(),
            ApiProfile {
                headers: HashMap::from([("X-Env".to_string(), "prod".to_string())]),
                ..ApiProfile::default()
            },
        );
        config
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("apis.json");

        let mut store = ApiStore::load(path.clone()).await;
        store.set("example", sample_api()).await.unwrap();

        let reloaded = ApiStore::load(path).await;
        let config = reloaded.get("example").unwrap();
        assert_eq!(config.base, "https://api.example.com");
        assert!(reloaded.profile("example", None).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_api_and_profile() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = ApiStore::load(temp_dir.path().join("apis.json")).await;
        store.set("example", sample_api()).await.unwrap();

        assert!(matches!(
            store.get("missing"),
            Err(StoreError::UnknownApi(_))
        ));
        assert!(matches!(
            store.profile("example", Some("staging")),
            Err(StoreError::UnknownProfile { .. })
        ));
        // Missing default profile is not an error
        let mut bare = sample_api();
        bare.profiles.clear();
        store.set("bare", bare).await.unwrap();
        assert!(store.profile("bare", None).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = ApiStore::load(temp_dir.path().join("apis.json")).await;
        store.set("zeta", sample_api()).await.unwrap();
        store.set("alpha", sample_api()).await.unwrap();

        assert_eq!(store.names(), vec!["alpha", "zeta"]);
    }
}
