//! Domain models for Wayfarer.

pub mod profile;
pub mod response;

pub use profile::{ApiConfig, ApiProfile, AuthDescriptor, HardwareTokenConfig, TlsConfig};
pub use response::{Link, Response};
