//! Field commit protocol: dirty-check, then write, then apply.
//!
//! Every operation here follows the same shape:
//!
//! 1. Normalise the input (trim, except for freeform model ids).
//! 2. Skip without touching the backend or the status tracker when the value
//!    is unchanged or the field is not editable for the provider.  The
//!    unchanged check is bypassed while a write for the same key is still in
//!    flight, so the newest value always reaches the backend.
//! 3. Bracket the backend call with the key's pending flag.
//! 4. On success apply the value to a new snapshot, unless a newer call for
//!    the same key started meanwhile.  Writes replace the provider's own
//!    value and never merge with an earlier read.
//!
//! Results for a provider that was removed from the list while its write was
//! in flight are dropped when applied.

use crate::config::ConfigurationSnapshot;
use crate::settings::error::{CommitOutcome, SettingsError, SkipReason};
use crate::settings::fallback::is_downloaded;
use crate::settings::keys::{Operation, PendingKey, SettingKey};
use crate::settings::resolver::{api_key_for, find_provider, model_for, resolve_selected_provider_id};
use crate::settings::store::SettingsStore;

fn skipped(key: &PendingKey, reason: SkipReason) -> Result<CommitOutcome, SettingsError> {
    log::debug!("{key}: skipped ({reason:?})");
    Ok(CommitOutcome::Skipped(reason))
}

fn still_listed(snapshot: &ConfigurationSnapshot, provider_id: &str) -> bool {
    let listed = find_provider(snapshot, provider_id).is_some();
    if !listed {
        log::debug!("provider '{provider_id}' was removed; dropping its result");
    }
    listed
}

impl SettingsStore {
    fn is_clean(&self, key: &PendingKey, unchanged: bool) -> bool {
        unchanged && !self.is_updating_key(key)
    }

    /// Make `provider_id` the active provider.
    ///
    /// No-op when it already is the resolved provider, which also spares the
    /// caller a redundant model refetch.  Ids missing from the provider list
    /// are skipped.
    pub async fn select_provider(&self, provider_id: &str) -> Result<CommitOutcome, SettingsError> {
        let snapshot = self.require_loaded()?;
        let key = PendingKey::global(Operation::ActiveProvider);
        if find_provider(&snapshot, provider_id).is_none() {
            return skipped(&key, SkipReason::UnknownProvider);
        }
        if self.is_clean(&key, provider_id == resolve_selected_provider_id(&snapshot)) {
            return skipped(&key, SkipReason::Unchanged);
        }

        let id = provider_id.to_string();
        self.run_commit(
            key,
            self.providers.set_active_provider(provider_id),
            move |s| s.transcription_provider_id = id,
        )
        .await
    }

    /// Commit an edited base URL.  Only providers with
    /// `allow_base_url_edit` accept one.
    pub async fn commit_base_url(
        &self,
        provider_id: &str,
        value: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        let snapshot = self.require_loaded()?;
        let key = PendingKey::scoped(Operation::BaseUrl, provider_id);
        let Some(provider) = find_provider(&snapshot, provider_id) else {
            return skipped(&key, SkipReason::UnknownProvider);
        };
        if !provider.allow_base_url_edit {
            return skipped(&key, SkipReason::NotEditable);
        }
        let trimmed = value.trim();
        if self.is_clean(&key, trimmed == provider.base_url) {
            return skipped(&key, SkipReason::Unchanged);
        }

        let id = provider_id.to_string();
        let url = trimmed.to_string();
        self.run_commit(
            key,
            self.providers.set_provider_base_url(provider_id, trimmed),
            move |s| {
                match s.transcription_providers.iter_mut().find(|p| p.id == id) {
                    Some(provider) => provider.base_url = url,
                    None => log::debug!("provider '{id}' was removed; dropping its result"),
                }
            },
        )
        .await
    }

    /// Commit an edited API key for one provider.
    pub async fn commit_api_key(
        &self,
        provider_id: &str,
        value: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        let snapshot = self.require_loaded()?;
        let key = PendingKey::scoped(Operation::ApiKey, provider_id);
        if find_provider(&snapshot, provider_id).is_none() {
            return skipped(&key, SkipReason::UnknownProvider);
        }
        let trimmed = value.trim();
        if self.is_clean(&key, trimmed == api_key_for(&snapshot, provider_id)) {
            return skipped(&key, SkipReason::Unchanged);
        }

        let id = provider_id.to_string();
        let api_key = trimmed.to_string();
        self.run_commit(
            key,
            self.providers.set_provider_api_key(provider_id, trimmed),
            move |s| {
                if still_listed(s, &id) {
                    s.transcription_api_keys.insert(id, api_key);
                }
            },
        )
        .await
    }

    /// Pick one of the offered models.  The value is trimmed.
    pub async fn select_model(
        &self,
        provider_id: &str,
        value: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        self.commit_model(provider_id, value.trim()).await
    }

    /// Use a freeform model id that is not in the offered list.  The value
    /// is stored verbatim.
    pub async fn create_model(
        &self,
        provider_id: &str,
        value: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        self.commit_model(provider_id, value).await
    }

    async fn commit_model(
        &self,
        provider_id: &str,
        model: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        let snapshot = self.require_loaded()?;
        let key = PendingKey::scoped(Operation::Model, provider_id);
        if find_provider(&snapshot, provider_id).is_none() {
            return skipped(&key, SkipReason::UnknownProvider);
        }
        if self.is_clean(&key, model == model_for(&snapshot, provider_id)) {
            return skipped(&key, SkipReason::Unchanged);
        }

        let id = provider_id.to_string();
        let value = model.to_string();
        self.run_commit(
            key,
            self.providers.set_provider_model(provider_id, model),
            move |s| {
                if still_listed(s, &id) {
                    s.transcription_models.insert(id, value);
                }
            },
        )
        .await
    }

    /// Fetch the provider's model list and replace its cache entry.
    ///
    /// While a fetch for the same provider is outstanding, no second request
    /// is issued and the current cache entry is returned instead.  A failed
    /// fetch leaves the cache entry as it was.
    pub async fn refresh_models(&self, provider_id: &str) -> Result<Vec<String>, SettingsError> {
        let key = PendingKey::scoped(Operation::ModelsFetch, provider_id);
        let Some(_guard) = self.status().try_begin(key) else {
            log::debug!("model fetch for '{provider_id}' already in flight");
            return Ok(self.model_options(provider_id));
        };

        let models = self
            .providers
            .list_provider_models(provider_id)
            .await
            .map_err(|source| SettingsError::Fetch {
                provider_id: provider_id.to_string(),
                source,
            })?;
        self.set_model_options(provider_id, models.clone());
        Ok(models)
    }

    /// Choose the local fallback model.  Only downloaded models are
    /// accepted; anything else is skipped with [`SkipReason::NotAvailable`].
    pub async fn select_fallback_model(
        &self,
        model_id: &str,
    ) -> Result<CommitOutcome, SettingsError> {
        if !is_downloaded(&self.local_models(), model_id) {
            let key = PendingKey::setting(SettingKey::CloudTranscriptionFallbackModelId);
            return skipped(&key, SkipReason::NotAvailable);
        }
        self.update_setting(SettingKey::CloudTranscriptionFallbackModelId, model_id.into())
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
