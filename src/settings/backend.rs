//! Collaborator contracts consumed by the settings core.
//!
//! The core never talks to disk or the network itself.  It goes through
//! three object-safe async traits, each held as `Arc<dyn …>`:
//!
//! * [`SettingsBackend`] loads the snapshot and writes/resets scalar settings.
//! * [`ProviderBackend`] performs provider-scoped writes and model listing.
//! * [`ModelCatalog`] reports which local models are downloaded.
//!
//! Production implementations live in [`crate::persist`],
//! [`crate::remote`] and [`crate::catalog`].  [`MockBackend`] and
//! [`StaticCatalog`] (available under `#[cfg(test)]`) record calls and can
//! hold each call at a gate so tests can observe in-flight state.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConfigurationSnapshot;
use crate::settings::keys::{SettingKey, SettingValue};

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Errors reported by collaborator implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Recorded audio could not be encoded for upload.
    #[error("failed to encode audio: {0}")]
    Audio(String),

    /// Reading or writing persisted settings failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// No provider with this id is configured.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// The provider's base URL is fixed.
    #[error("base URL of provider '{0}' is not editable")]
    NotEditable(String),

    /// Any other refusal.
    #[error("rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistence of the whole snapshot and of scalar settings.
///
/// Writes must be idempotent for identical `(key, value)` pairs.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn load(&self) -> Result<ConfigurationSnapshot, BackendError>;
    async fn write(&self, key: SettingKey, value: SettingValue) -> Result<(), BackendError>;
    async fn reset(&self, key: SettingKey) -> Result<(), BackendError>;
}

/// Provider-scoped writes and the provider model listing.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    async fn set_active_provider(&self, provider_id: &str) -> Result<(), BackendError>;
    async fn set_provider_base_url(&self, provider_id: &str, url: &str)
        -> Result<(), BackendError>;
    async fn set_provider_api_key(&self, provider_id: &str, key: &str)
        -> Result<(), BackendError>;
    async fn set_provider_model(&self, provider_id: &str, model: &str)
        -> Result<(), BackendError>;
    async fn list_provider_models(&self, provider_id: &str) -> Result<Vec<String>, BackendError>;
}

/// A local transcription model as reported by the model catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalModel {
    pub id: String,
    pub name: String,
    pub is_downloaded: bool,
}

/// Source of local models that can serve as the fallback.  The core only
/// filters what it gets; it never downloads anything.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn local_models(&self) -> Result<Vec<LocalModel>, BackendError>;

    /// Id of the local model the app currently transcribes with, if any.
    fn current_model(&self) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::{MockBackend, StaticCatalog};


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
