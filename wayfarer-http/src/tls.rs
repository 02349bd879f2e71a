//! TLS assembly.
//!
//! Builds the HTTP client from merged TLS material. Assembly is idempotent
//! and order-sensitive: CLI-level flags override profile-level material (the
//! merge itself lives in `TlsConfig::overlay`). A hardware-token identity is
//! a lazily-evaluated credential source, memoized for the client's lifetime,
//! so the PIN prompt fires at most once and never during request
//! construction.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;
use wayfarer_core::HardwareTokenConfig;

use crate::error::HttpError;

/// Environment variable consulted by the default PIN source.
pub const PIN_ENV: &str = "WAYFARER_TOKEN_PIN";

/// Default connect timeout for the underlying client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// PIN Source
// ============================================================================

/// Supplies the PIN protecting a hardware-token identity.
///
/// May block on interactive input; the pipeline is synchronous and
/// single-threaded, so that is acceptable.
pub trait PinSource: Send + Sync {
    /// Returns the PIN for the labeled token.
    fn pin(&self, label: &str) -> Result<String, HttpError>;
}

/// Reads the PIN from the [`PIN_ENV`] environment variable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvPinSource;

impl PinSource for EnvPinSource {
    fn pin(&self, label: &str) -> Result<String, HttpError> {
        std::env::var(PIN_ENV).map_err(|_| {
            HttpError::Tls(format!(
                "token {label} requires a PIN; set {PIN_ENV} or configure an interactive source"
            ))
        })
    }
}

/// Fixed PIN, for tests.
#[derive(Debug, Clone)]
pub struct StaticPinSource(pub String);

impl PinSource for StaticPinSource {
    fn pin(&self, _label: &str) -> Result<String, HttpError> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// Hardware Identity
// ============================================================================

/// Lazily-loaded hardware-token client identity.
///
/// The token middleware exports a PKCS#12 bundle protected by the token
/// PIN. Nothing is read and no PIN is requested until the TLS handshake
/// actually needs the identity; the outcome is memoized so repeated client
/// builds never re-prompt.
pub struct HardwareIdentity {
    config: HardwareTokenConfig,
    pin_source: Arc<dyn PinSource>,
    cell: OnceLock<Result<reqwest::Identity, String>>,
}

impl HardwareIdentity {
    /// Creates a lazy identity for the token configuration.
    pub fn new(config: HardwareTokenConfig, pin_source: Arc<dyn PinSource>) -> Self {
        Self {
            config,
            pin_source,
            cell: OnceLock::new(),
        }
    }

    /// Returns the identity, loading and memoizing on first use.
    pub fn identity(&self) -> Result<reqwest::Identity, HttpError> {
        self.cell
            .get_or_init(|| self.load().map_err(|e| e.to_string()))
            .clone()
            .map_err(HttpError::Tls)
    }

    /// Returns true if the identity has already been evaluated.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    fn load(&self) -> Result<reqwest::Identity, HttpError> {
        let label = self.config.label.as_deref().unwrap_or("hardware token");
        let pin = self.pin_source.pin(label)?;

        debug!(identity = %self.config.identity.display(), "Loading hardware-token identity");
        let der = std::fs::read(&self.config.identity).map_err(|e| {
            HttpError::Tls(format!(
                "cannot read token identity {}: {e}",
                self.config.identity.display()
            ))
        })?;

        reqwest::Identity::from_pkcs12_der(&der, &pin)
            .map_err(|e| HttpError::Tls(format!("cannot load token identity: {e}")))
    }
}

impl std::fmt::Debug for HardwareIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareIdentity")
            .field("identity", &self.config.identity)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

// ============================================================================
// Client Assembly
// ============================================================================

/// Builds the HTTP client from merged TLS material.
///
/// `hardware` must be the memoized identity for `tls.hardware_token`, if
/// one is configured; it is evaluated here, immediately before the first
/// handshake can happen, never earlier.
pub fn build_client(
    tls: &wayfarer_core::TlsConfig,
    hardware: Option<&HardwareIdentity>,
) -> Result<reqwest::Client, HttpError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT);

    if tls.insecure {
        debug!("TLS verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_path) = &tls.ca_cert {
        let pem = std::fs::read(ca_path)
            .map_err(|e| HttpError::Tls(format!("cannot read CA cert {}: {e}", ca_path.display())))?;
        let cert = reqwest::Certificate::from_pem(&pem)
            .map_err(|e| HttpError::Tls(format!("invalid CA cert {}: {e}", ca_path.display())))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&tls.cert, &tls.key) {
        (Some(cert_path), Some(key_path)) => {
            let mut pem = std::fs::read(cert_path).map_err(|e| {
                HttpError::Tls(format!("cannot read cert {}: {e}", cert_path.display()))
            })?;
            let key = std::fs::read(key_path).map_err(|e| {
                HttpError::Tls(format!("cannot read key {}: {e}", key_path.display()))
            })?;
            pem.extend_from_slice(&key);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| HttpError::Tls(format!("invalid client identity: {e}")))?;
            builder = builder.identity(identity).use_rustls_tls();
        }
        (None, None) => {}
        _ => {
            return Err(HttpError::Tls(
                "client cert and key must both be set".to_string(),
            ))
        }
    }

    if tls.hardware_token.is_some() {
        let hardware = hardware.ok_or_else(|| {
            HttpError::Tls("hardware token configured but no identity source".to_string())
        })?;
        // PKCS#12 identities go through the platform TLS stack
        builder = builder.identity(hardware.identity()?).use_native_tls();
    }

    Ok(builder.build()?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wayfarer_core::TlsConfig;

    struct CountingPinSource(AtomicUsize);

    impl PinSource for CountingPinSource {
        fn pin(&self, _label: &str) -> Result<String, HttpError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(HttpError::Tls("no pin available".to_string()))
        }
    }

    #[test]
    fn test_lazy_identity_not_loaded_on_construction() {
        let identity = HardwareIdentity::new(
            HardwareTokenConfig {
                identity: PathBuf::from("/nonexistent.p12"),
                label: Some("test-token".to_string()),
            },
            Arc::new(StaticPinSource("1234".to_string())),
        );
        assert!(!identity.is_loaded());
    }

    #[test]
    fn test_pin_requested_at_most_once() {
        let source = Arc::new(CountingPinSource(AtomicUsize::new(0)));
        let identity = HardwareIdentity::new(
            HardwareTokenConfig {
                identity: PathBuf::from("/nonexistent.p12"),
                label: None,
            },
            source.clone(),
        );

        // The failure is memoized too; the user is not re-prompted
        assert!(identity.identity().is_err());
        assert!(identity.identity().is_err());
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plain_client_builds() {
        assert!(build_client(&TlsConfig::default(), None).is_ok());
    }

    #[test]
    fn test_insecure_client_builds() {
        let tls = TlsConfig {
            insecure: true,
            ..TlsConfig::default()
        };
        assert!(build_client(&tls, None).is_ok());
    }

    #[test]
    fn test_cert_without_key_rejected() {
        let tls = TlsConfig {
            cert: Some(PathBuf::from("/tmp/cert.pem")),
            ..TlsConfig::default()
        };
        assert!(matches!(build_client(&tls, None), Err(HttpError::Tls(_))));
    }
}
