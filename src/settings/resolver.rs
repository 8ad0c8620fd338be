//! Pure derivations over a [`ConfigurationSnapshot`].
//!
//! Nothing here caches or mutates; every getter degrades to an empty string
//! or `false` instead of failing, so the interface can always render a
//! coherent (if inactive) state.
//!
//! Provider resolution chain:
//!
//! ```text
//! transcription_provider_id (non-empty and in the list)
//!   └─▶ first entry of transcription_providers
//!         └─▶ DEFAULT_PROVIDER_ID ("groq") when the list is empty
//! ```

use crate::config::{
    ConfigurationSnapshot, ProviderDescriptor, CUSTOM_PROVIDER_ID, DEFAULT_PROVIDER_ID,
};

/// Id of the provider that is currently in effect.
///
/// A stored id that no longer names a provider in the list (the provider was
/// removed) resolves like an unset id.
pub fn resolve_selected_provider_id(snapshot: &ConfigurationSnapshot) -> &str {
    let providers = &snapshot.transcription_providers;
    let stored = snapshot.transcription_provider_id.as_str();

    if !stored.is_empty() && providers.iter().any(|p| p.id == stored) {
        return stored;
    }
    providers
        .first()
        .map(|p| p.id.as_str())
        .unwrap_or(DEFAULT_PROVIDER_ID)
}

/// Descriptor of the provider in effect; `None` only for an empty list.
pub fn resolve_selected_provider(snapshot: &ConfigurationSnapshot) -> Option<&ProviderDescriptor> {
    let id = resolve_selected_provider_id(snapshot);
    find_provider(snapshot, id).or_else(|| snapshot.transcription_providers.first())
}

pub fn find_provider<'a>(
    snapshot: &'a ConfigurationSnapshot,
    provider_id: &str,
) -> Option<&'a ProviderDescriptor> {
    snapshot
        .transcription_providers
        .iter()
        .find(|p| p.id == provider_id)
}

pub fn is_custom_provider(provider: Option<&ProviderDescriptor>) -> bool {
    provider.is_some_and(|p| p.id == CUSTOM_PROVIDER_ID)
}

pub fn base_url_for(provider: Option<&ProviderDescriptor>) -> &str {
    provider.map(|p| p.base_url.as_str()).unwrap_or("")
}

pub fn api_key_for<'a>(snapshot: &'a ConfigurationSnapshot, provider_id: &str) -> &'a str {
    snapshot
        .transcription_api_keys
        .get(provider_id)
        .map(String::as_str)
        .unwrap_or("")
}

pub fn model_for<'a>(snapshot: &'a ConfigurationSnapshot, provider_id: &str) -> &'a str {
    snapshot
        .transcription_models
        .get(provider_id)
        .map(String::as_str)
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// CloudTarget
// ---------------------------------------------------------------------------

/// Everything a transcription request to the selected provider needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTarget {
    pub provider_id: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// The cloud endpoint to use, or `None` when cloud transcription is
/// disabled or no provider is configured.
pub fn cloud_target(snapshot: &ConfigurationSnapshot) -> Option<CloudTarget> {
    if !snapshot.cloud_transcription_enabled {
        return None;
    }
    let provider = resolve_selected_provider(snapshot)?;
    Some(CloudTarget {
        provider_id: provider.id.clone(),
        base_url: provider.base_url.clone(),
        api_key: api_key_for(snapshot, &provider.id).to_string(),
        model: model_for(snapshot, &provider.id).to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
