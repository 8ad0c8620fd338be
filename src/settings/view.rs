//! Presentation view-models.
//!
//! Everything here is recomputed from the current snapshot, the model caches
//! and the status tracker on each call.  Nothing is cached, so a view can
//! never be stale relative to the store.

use crate::config::ProviderDescriptor;
use crate::settings::fallback::{displayed_selection, fallback_model, fallback_options};
use crate::settings::keys::{Operation, PendingKey, SettingKey};
use crate::settings::resolver::{
    api_key_for, base_url_for, is_custom_provider, model_for, resolve_selected_provider,
    resolve_selected_provider_id,
};
use crate::settings::store::SettingsStore;

/// One entry of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// State of the provider section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderView {
    /// Cloud transcription switch.
    pub enabled: bool,
    /// `false` while the section should render inert (cloud disabled or
    /// settings not loaded yet).
    pub active: bool,
    pub provider_options: Vec<SelectOption>,
    pub selected_provider_id: String,
    pub selected_provider: Option<ProviderDescriptor>,
    pub is_custom_provider: bool,
    /// The base URL field is only shown for the custom provider.
    pub show_base_url: bool,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub model_options: Vec<String>,
    pub is_switching_provider: bool,
    pub is_fetching_models: bool,
    pub is_base_url_updating: bool,
    pub is_api_key_updating: bool,
    pub is_model_updating: bool,
}

/// State of the local fallback section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    pub enabled: bool,
    /// `false` while cloud transcription is off.
    pub active: bool,
    pub is_toggle_updating: bool,
    /// Downloaded local models only.
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
    /// The model dropdown is disabled while fallback is off or the local
    /// model list is loading.
    pub disabled: bool,
    /// No local model is downloaded.
    pub show_empty_notice: bool,
}

/// The whole cloud transcription settings page.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudTranscriptionView {
    pub enabled: bool,
    pub is_toggle_updating: bool,
    pub provider: ProviderView,
    pub fallback: FallbackView,
}

impl SettingsStore {
    pub fn view(&self) -> CloudTranscriptionView {
        let provider = self.provider_view();
        CloudTranscriptionView {
            enabled: provider.enabled,
            is_toggle_updating: self.is_updating_setting(SettingKey::CloudTranscriptionEnabled),
            fallback: self.fallback_view(),
            provider,
        }
    }

    pub fn provider_view(&self) -> ProviderView {
        let snapshot = self.snapshot();
        let id = resolve_selected_provider_id(&snapshot).to_string();
        let provider = resolve_selected_provider(&snapshot);
        let scoped =
            |operation: Operation| self.is_updating_key(&PendingKey::scoped(operation, id.as_str()));
        let is_custom = is_custom_provider(provider);

        ProviderView {
            enabled: snapshot.cloud_transcription_enabled,
            active: snapshot.cloud_transcription_enabled && !self.is_loading(),
            provider_options: snapshot
                .transcription_providers
                .iter()
                .map(|p| SelectOption {
                    value: p.id.clone(),
                    label: p.label.clone(),
                })
                .collect(),
            selected_provider: provider.cloned(),
            is_custom_provider: is_custom,
            show_base_url: is_custom,
            base_url: base_url_for(provider).to_string(),
            api_key: api_key_for(&snapshot, &id).to_string(),
            model: model_for(&snapshot, &id).to_string(),
            model_options: self.model_options(&id),
            is_switching_provider: self
                .is_updating_key(&PendingKey::global(Operation::ActiveProvider)),
            is_fetching_models: scoped(Operation::ModelsFetch),
            is_base_url_updating: scoped(Operation::BaseUrl),
            is_api_key_updating: scoped(Operation::ApiKey),
            is_model_updating: scoped(Operation::Model),
            selected_provider_id: id.clone(),
        }
    }

    pub fn fallback_view(&self) -> FallbackView {
        let snapshot = self.snapshot();
        let options = fallback_options(&self.local_models());
        let loading_models = self.is_updating_key(&PendingKey::global(Operation::LocalModels));
        let current = self.current_local_model();

        FallbackView {
            enabled: snapshot.cloud_transcription_fallback_enabled,
            active: snapshot.cloud_transcription_enabled,
            is_toggle_updating: self
                .is_updating_setting(SettingKey::CloudTranscriptionFallbackEnabled),
            selected: displayed_selection(
                &snapshot.cloud_transcription_fallback_model_id,
                current.as_deref(),
            ),
            disabled: !snapshot.cloud_transcription_fallback_enabled || loading_models,
            show_empty_notice: options.is_empty(),
            options,
        }
    }

    /// Local model the app falls back to right now, resolved the same way
    /// the fallback section displays its selection.
    pub fn fallback_model(&self) -> Option<String> {
        let snapshot = self.snapshot();
        let current = self.current_local_model();
        fallback_model(&snapshot, &self.local_models(), current.as_deref()).map(str::to_string)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
