//! Cloud transcription settings core.
//!
//! Holds the provider configuration, resolves the provider in effect from
//! partial settings, commits field edits without redundant writes and tracks
//! which keys have work in flight.
//!
//! ```text
//! SettingsStore ──▶ snapshot (Arc<ConfigurationSnapshot>)
//!      │                 └─▶ resolver / fallback / view (pure reads)
//!      ├─▶ commit protocol ──▶ SettingsBackend / ProviderBackend
//!      └─▶ AsyncStatusTracker (pending keys)
//! ```

pub mod backend;
pub mod commit;
pub mod error;
pub mod fallback;
pub mod keys;
pub mod resolver;
pub mod status;
pub mod store;
pub mod view;

pub use backend::{BackendError, LocalModel, ModelCatalog, ProviderBackend, SettingsBackend};
pub use error::{CommitOutcome, SettingsError, SkipReason};
pub use fallback::{fallback_model, fallback_options};
pub use keys::{Operation, PendingKey, SettingKey, SettingValue};
pub use resolver::{cloud_target, resolve_selected_provider, resolve_selected_provider_id, CloudTarget};
pub use status::{AsyncStatusTracker, PendingGuard};
pub use store::SettingsStore;
pub use view::{CloudTranscriptionView, FallbackView, ProviderView, SelectOption};

#[cfg(test)]
pub use backend::{MockBackend, StaticCatalog};
