//! File persistence helpers.
//!
//! Loading and saving state to disk. Writes are atomic (temp file + rename)
//! so independently-launched processes sharing the config and cache
//! directories never observe a torn file, and permissions are restricted on
//! Unix because profiles can contain credentials.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - Linux: `~/.config/wayfarer`
/// - macOS: `~/Library/Application Support/wayfarer`
/// - Windows: `%APPDATA%\wayfarer`
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|c| c.join("wayfarer"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default cache directory.
///
/// - Linux: `~/.cache/wayfarer`
/// - macOS: `~/Library/Caches/wayfarer`
/// - Windows: `%LOCALAPPDATA%\wayfarer`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|c| c.join("wayfarer"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the default API configuration file path.
pub fn default_apis_path() -> PathBuf {
    default_config_dir().join("apis.json")
}

/// Returns the default auth-token cache file path.
pub fn default_tokens_path() -> PathBuf {
    default_config_dir().join("tokens.json")
}

/// Returns the default response cache directory.
pub fn default_responses_dir() -> PathBuf {
    default_cache_dir().join("responses")
}

/// Returns the default spec freshness index path.
pub fn default_freshness_path() -> PathBuf {
    default_cache_dir().join("spec_expiry.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets restrictive file permissions (0o600) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Sets restrictive directory permissions (0o700) on Unix systems.
#[cfg(unix)]
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path).await?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o700);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

/// No-op for non-Unix systems.
#[cfg(not(unix))]
async fn set_restrictive_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Saves data to a JSON file with secure permissions.
///
/// Creates parent directories if they don't exist and writes atomically:
/// the temp-file write happens first, the rename is the last step, so a
/// crash in between never leaves a corrupt file behind.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
            set_restrictive_dir_permissions(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_restrictive_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

/// Loads data from a JSON file, returning default if not found.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !matches!(e, StoreError::Io(_)) {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

/// Ensures a directory exists with secure permissions.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
        set_restrictive_dir_permissions(path).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_paths() {
        assert!(default_apis_path().ends_with("apis.json"));
        assert!(default_responses_dir().ends_with("responses"));
        assert!(!default_cache_dir().as_os_str().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("data.json");

        let data = HashMap::from([("key".to_string(), 42u32)]);
        save_json(&path, &data).await.unwrap();

        let back: HashMap<String, u32> = load_json(&path).await.unwrap();
        assert_eq!(back, data);

        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_uses_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");

        let data: HashMap<String, u32> = load_json_or_default(&path).await;
        assert!(data.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("secret.json");
        save_json(&path, &HashMap::from([("token", "s3cret")]))
            .await
            .unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }
}
