//! Typed keys for the generic setting path and for pending-operation
//! tracking.
//!
//! The presentation layer historically tracked busy fields with strings such
//! as `"transcription_api_key:groq"`.  Here the operation and its scope are
//! separate fields of [`PendingKey`], so two different operations can never
//! collide; `Display` still renders the familiar composite form.

use std::fmt;

use crate::config::ConfigurationSnapshot;
use crate::settings::error::SettingsError;

// ---------------------------------------------------------------------------
// SettingKey / SettingValue
// ---------------------------------------------------------------------------

/// Scalar settings reachable through `get_setting` / `update_setting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    CloudTranscriptionEnabled,
    CloudTranscriptionFallbackEnabled,
    CloudTranscriptionFallbackModelId,
    TranscriptionProviderId,
}

/// Value of a scalar setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            SettingValue::Bool(_) => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl SettingKey {
    /// Persisted (snake_case) name of the setting.
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::CloudTranscriptionEnabled => "cloud_transcription_enabled",
            SettingKey::CloudTranscriptionFallbackEnabled => "cloud_transcription_fallback_enabled",
            SettingKey::CloudTranscriptionFallbackModelId => {
                "cloud_transcription_fallback_model_id"
            }
            SettingKey::TranscriptionProviderId => "transcription_provider_id",
        }
    }

    fn expects_bool(self) -> bool {
        matches!(
            self,
            SettingKey::CloudTranscriptionEnabled | SettingKey::CloudTranscriptionFallbackEnabled
        )
    }

    /// Project the current value out of `snapshot`.
    pub fn read(self, snapshot: &ConfigurationSnapshot) -> SettingValue {
        match self {
            SettingKey::CloudTranscriptionEnabled => {
                SettingValue::Bool(snapshot.cloud_transcription_enabled)
            }
            SettingKey::CloudTranscriptionFallbackEnabled => {
                SettingValue::Bool(snapshot.cloud_transcription_fallback_enabled)
            }
            SettingKey::CloudTranscriptionFallbackModelId => {
                SettingValue::Text(snapshot.cloud_transcription_fallback_model_id.clone())
            }
            SettingKey::TranscriptionProviderId => {
                SettingValue::Text(snapshot.transcription_provider_id.clone())
            }
        }
    }

    /// Fail with [`SettingsError::TypeMismatch`] unless `value` has the
    /// variant this key stores.
    pub fn check(self, value: &SettingValue) -> Result<(), SettingsError> {
        let ok = match value {
            SettingValue::Bool(_) => self.expects_bool(),
            SettingValue::Text(_) => !self.expects_bool(),
        };
        if ok {
            Ok(())
        } else {
            Err(SettingsError::TypeMismatch {
                key: self,
                expected: if self.expects_bool() { "bool" } else { "text" },
            })
        }
    }

    /// Overwrite this key's field in `snapshot` with `value`.
    pub fn apply(
        self,
        snapshot: &mut ConfigurationSnapshot,
        value: SettingValue,
    ) -> Result<(), SettingsError> {
        self.check(&value)?;
        self.assign(snapshot, value);
        Ok(())
    }

    /// Like [`apply`](Self::apply) for a value that already passed
    /// [`check`](Self::check).
    pub(crate) fn assign(self, snapshot: &mut ConfigurationSnapshot, value: SettingValue) {
        match (self, value) {
            (SettingKey::CloudTranscriptionEnabled, SettingValue::Bool(b)) => {
                snapshot.cloud_transcription_enabled = b;
            }
            (SettingKey::CloudTranscriptionFallbackEnabled, SettingValue::Bool(b)) => {
                snapshot.cloud_transcription_fallback_enabled = b;
            }
            (SettingKey::CloudTranscriptionFallbackModelId, SettingValue::Text(s)) => {
                snapshot.cloud_transcription_fallback_model_id = s;
            }
            (SettingKey::TranscriptionProviderId, SettingValue::Text(s)) => {
                snapshot.transcription_provider_id = s;
            }
            (key, value) => log::debug!("{key}: ignoring mistyped value {value:?}"),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Operation / PendingKey
// ---------------------------------------------------------------------------

/// Kind of asynchronous work tracked by the status tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Switching the active provider.
    ActiveProvider,
    /// Writing a provider's base URL.
    BaseUrl,
    /// Writing a provider's API key.
    ApiKey,
    /// Writing a provider's selected model.
    Model,
    /// Fetching a provider's model list.
    ModelsFetch,
    /// Loading the local model catalog.
    LocalModels,
    /// Writing a scalar setting through the generic path.
    Setting(SettingKey),
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ActiveProvider => "transcription_provider_id",
            Operation::BaseUrl => "transcription_base_url",
            Operation::ApiKey => "transcription_api_key",
            Operation::Model => "transcription_model",
            Operation::ModelsFetch => "transcription_models_fetch",
            Operation::LocalModels => "local_models",
            Operation::Setting(key) => key.as_str(),
        }
    }
}

/// Identifies one (operation, scope) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingKey {
    pub operation: Operation,
    pub scope: Option<String>,
}

impl PendingKey {
    /// Key scoped to one provider.
    pub fn scoped(operation: Operation, scope: impl Into<String>) -> Self {
        Self {
            operation,
            scope: Some(scope.into()),
        }
    }

    /// Key with no scope (global settings, provider switch).
    pub fn global(operation: Operation) -> Self {
        Self {
            operation,
            scope: None,
        }
    }

    /// Key of a scalar setting.  The provider id shares its key with
    /// provider switching, so every write to it reports the same pending
    /// state.
    pub fn setting(key: SettingKey) -> Self {
        match key {
            SettingKey::TranscriptionProviderId => Self::global(Operation::ActiveProvider),
            key => Self::global(Operation::Setting(key)),
        }
    }
}

impl fmt::Display for PendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", self.operation.as_str(), scope),
            None => f.write_str(self.operation.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
