//! Errors and outcomes of settings operations.
//!
//! Skipped commits are not errors: an unchanged value or a field that the
//! current provider does not allow to be edited yields
//! `Ok(CommitOutcome::Skipped(_))` and never touches the status tracker.

use thiserror::Error;

use crate::settings::backend::BackendError;
use crate::settings::keys::{PendingKey, SettingKey};

// ---------------------------------------------------------------------------
// SettingsError
// ---------------------------------------------------------------------------

/// Failures surfaced to the caller of a store operation.
///
/// None of them is fatal: the snapshot stays at its last known-good value
/// and the store remains usable.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The backend rejected a write.  Never retried automatically.
    #[error("failed to persist {key}: {source}")]
    Persist {
        key: PendingKey,
        #[source]
        source: BackendError,
    },

    /// Listing a provider's models failed; the previous list is kept.
    #[error("failed to fetch models for provider '{provider_id}': {source}")]
    Fetch {
        provider_id: String,
        #[source]
        source: BackendError,
    },

    /// Loading settings or local models failed.
    #[error("failed to load settings: {0}")]
    Load(#[source] BackendError),

    /// `update_setting` was called with the wrong value variant.
    #[error("setting {key} expects a {expected} value")]
    TypeMismatch {
        key: SettingKey,
        expected: &'static str,
    },

    /// An operation that needs loaded settings ran before `initialize`.
    #[error("settings have not been loaded yet")]
    NotLoaded,
}

// ---------------------------------------------------------------------------
// CommitOutcome
// ---------------------------------------------------------------------------

/// Why a commit was skipped without contacting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The (trimmed) value equals the stored one.
    Unchanged,
    /// The provider does not allow editing this field.
    NotEditable,
    /// No provider with the given id is in the provider list.
    UnknownProvider,
    /// The fallback model is not downloaded locally.
    NotAvailable,
}

/// Successful result of a commit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The backend accepted the write and the snapshot now reflects it.
    Committed,
    /// Nothing was written.
    Skipped(SkipReason),
    /// The backend accepted the write, but a newer call for the same key was
    /// issued meanwhile; that newer call decides the snapshot value.
    Superseded,
}

impl CommitOutcome {
    pub fn is_committed(self) -> bool {
        self == CommitOutcome::Committed
    }

    pub fn is_skipped(self) -> bool {
        matches!(self, CommitOutcome::Skipped(_))
    }
}
