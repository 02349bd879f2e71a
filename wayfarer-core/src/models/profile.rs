//! API profile configuration models.
//!
//! A named API has one or more profiles. Profiles contribute default
//! headers/query parameters, an auth descriptor, and TLS material to every
//! request made against that API. They are loaded once per process start and
//! are immutable during a command's execution (the auth-token cache is the
//! only side-effecting state).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// TLS Configuration
// ============================================================================

/// Client-side TLS material for an API or profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Skip server certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    /// Path to a PEM client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,
    /// Path to the PEM private key for `cert`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,
    /// Path to a PEM CA certificate to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
    /// Hardware-token identity source, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_token: Option<HardwareTokenConfig>,
}

impl TlsConfig {
    /// Overlays higher-precedence TLS material on top of this config.
    ///
    /// CLI-level flags override profile-level material, never the reverse.
    /// Unset fields in the overlay leave the base untouched.
    pub fn overlay(&self, over: &TlsConfig) -> TlsConfig {
        TlsConfig {
            insecure: self.insecure || over.insecure,
            cert: over.cert.clone().or_else(|| self.cert.clone()),
            key: over.key.clone().or_else(|| self.key.clone()),
            ca_cert: over.ca_cert.clone().or_else(|| self.ca_cert.clone()),
            hardware_token: over
                .hardware_token
                .clone()
                .or_else(|| self.hardware_token.clone()),
        }
    }

    /// Returns true if no material is configured at all.
    pub fn is_empty(&self) -> bool {
        *self == TlsConfig::default()
    }
}

/// Hardware-token identity source.
///
/// The identity is loaded lazily, at most once per process, so a PIN prompt
/// never fires during request construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareTokenConfig {
    /// Path to the token-backed identity (PKCS#12 bundle exported by the
    /// token middleware).
    pub identity: PathBuf,
    /// Token label, for display and PIN prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ============================================================================
// Auth Descriptor
// ============================================================================

/// Names an auth scheme and carries its string parameters.
///
/// The scheme name selects a registered auth handler; the parameters are
/// interpreted by that handler (e.g. `username`/`password` for basic auth).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    /// Registered scheme name (e.g. `basic`, `bearer`, `api-key`).
    pub name: String,
    /// Scheme-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, String>,
}

// ============================================================================
// API Profile
// ============================================================================

/// One named profile within an API configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiProfile {
    /// Base URI override for this profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Default headers applied to every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Default query parameters applied to every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub query: HashMap<String, String>,
    /// Auth scheme and parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthDescriptor>,
    /// Profile-level TLS material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

/// Configuration for one named API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URI for the API.
    pub base: String,
    /// Named profiles; `default` is used when none is selected.
    #[serde(default)]
    pub profiles: HashMap<String, ApiProfile>,
    /// API-level TLS material, overridden by profile-level material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

impl ApiConfig {
    /// Looks up a profile by name, defaulting to `default`.
    pub fn profile(&self, name: Option<&str>) -> Option<&ApiProfile> {
        self.profiles.get(name.unwrap_or("default"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_overlay_precedence() {
        let profile = TlsConfig {
            insecure: false,
            cert: Some(PathBuf::from("/profile/cert.pem")),
            key: Some(PathBuf::from("/profile/key.pem")),
            ca_cert: None,
            hardware_token: None,
        };
        let cli = TlsConfig {
            insecure: true,
            cert: Some(PathBuf::from("/cli/cert.pem")),
            ..TlsConfig::default()
        };

        let merged = profile.overlay(&cli);
        assert!(merged.insecure);
        assert_eq!(merged.cert, Some(PathBuf::from("/cli/cert.pem")));
        // Fields the CLI leaves unset fall through to the profile
        assert_eq!(merged.key, Some(PathBuf::from("/profile/key.pem")));
    }

    #[test]
    fn test_profile_lookup_default() {
        let mut config = ApiConfig {
            base: "https://api.example.com".to_string(),
            ..ApiConfig::default()
        };
        config
            .profiles
            .insert("default".to_string(), ApiProfile::default());

        assert!(config.profile(None).is_some());
        assert!(config.profile(Some("default")).is_some());
        assert!(config.profile(Some("staging")).is_none());
    }

    #[test]
    fn test_profile_roundtrip() {
        let profile = ApiProfile {
            base: Some("https://staging.example.com".to_string()),
            headers: HashMap::from([("X-Team".to_string(), "core".to_string())]),
            auth: Some(AuthDescriptor {
                name: "basic".to_string(),
                params: HashMap::from([("username".to_string(), "alice".to_string())]),
            }),
            ..ApiProfile::default()
        };

        let json = serde_json::to_string(&profile).unwrap();
        let back: ApiProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, back);
    }
}
