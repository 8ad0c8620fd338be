//! The settings container consumed by the presentation layer.
//!
//! [`SettingsStore`] owns the current [`ConfigurationSnapshot`], the
//! per-provider model option cache, the local model list and the
//! [`AsyncStatusTracker`].  It is created empty, filled by
//! [`initialize`](SettingsStore::initialize), and afterwards changed only by
//! commit operations (see `commit.rs`) and explicit refreshes.  There is no
//! background refresh.
//!
//! Readers get an `Arc<ConfigurationSnapshot>`; writers build a new snapshot
//! and swap it in, so a reader never sees a half-applied change.
//!
//! # Sharing
//!
//! All operations take `&self`.  Hold the store in an `Arc<SettingsStore>`
//! and hand clones of it to whoever renders or edits settings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ConfigurationSnapshot;
use crate::settings::backend::{LocalModel, ModelCatalog, ProviderBackend, SettingsBackend};
use crate::settings::error::{CommitOutcome, SettingsError, SkipReason};
use crate::settings::keys::{Operation, PendingKey, SettingKey, SettingValue};
use crate::settings::status::AsyncStatusTracker;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

pub struct SettingsStore {
    pub(crate) settings: Arc<dyn SettingsBackend>,
    pub(crate) providers: Arc<dyn ProviderBackend>,
    catalog: Arc<dyn ModelCatalog>,
    /// `None` until the first successful load.
    snapshot: Mutex<Option<Arc<ConfigurationSnapshot>>>,
    model_options: Mutex<HashMap<String, Vec<String>>>,
    local_models: Mutex<Vec<LocalModel>>,
    status: AsyncStatusTracker,
}

impl SettingsStore {
    /// Create an empty, not-yet-loaded store.
    pub fn new(
        settings: Arc<dyn SettingsBackend>,
        providers: Arc<dyn ProviderBackend>,
        catalog: Arc<dyn ModelCatalog>,
    ) -> Self {
        Self {
            settings,
            providers,
            catalog,
            snapshot: Mutex::new(None),
            model_options: Mutex::new(HashMap::new()),
            local_models: Mutex::new(Vec::new()),
            status: AsyncStatusTracker::new(),
        }
    }

    /// Convenience constructor for a backend that implements both the
    /// settings and the provider contract.
    pub fn with_backend<B>(backend: Arc<B>, catalog: Arc<dyn ModelCatalog>) -> Self
    where
        B: SettingsBackend + ProviderBackend + 'static,
    {
        Self::new(backend.clone(), backend, catalog)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Initial load from the settings backend.
    pub async fn initialize(&self) -> Result<(), SettingsError> {
        self.refresh_settings().await
    }

    /// Replace the snapshot with a fresh `load()`.  On failure the current
    /// snapshot is kept.
    pub async fn refresh_settings(&self) -> Result<(), SettingsError> {
        let loaded = self.settings.load().await.map_err(SettingsError::Load)?;
        *lock(&self.snapshot) = Some(Arc::new(loaded));
        log::debug!("settings snapshot replaced from backend");
        Ok(())
    }

    /// `true` until the first successful load.
    pub fn is_loading(&self) -> bool {
        lock(&self.snapshot).is_none()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current snapshot.  Before the first load this is an empty snapshot
    /// (no providers), which every derivation handles.
    pub fn snapshot(&self) -> Arc<ConfigurationSnapshot> {
        lock(&self.snapshot)
            .clone()
            .unwrap_or_else(|| Arc::new(ConfigurationSnapshot::empty()))
    }

    /// Read-only projection of one scalar setting; `None` before the first
    /// load.
    pub fn get_setting(&self, key: SettingKey) -> Option<SettingValue> {
        lock(&self.snapshot).as_deref().map(|s| key.read(s))
    }

    /// Whether work for `key` is in flight.  Cheap; safe to call every frame.
    pub fn is_updating_key(&self, key: &PendingKey) -> bool {
        self.status.is_pending(key)
    }

    pub fn is_updating_setting(&self, key: SettingKey) -> bool {
        self.is_updating_key(&PendingKey::setting(key))
    }

    pub fn pending_keys(&self) -> Vec<PendingKey> {
        self.status.pending_keys()
    }

    /// Last fetched model list for `provider_id` (empty if never fetched).
    pub fn model_options(&self, provider_id: &str) -> Vec<String> {
        lock(&self.model_options)
            .get(provider_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Local models from the last catalog refresh.
    pub fn local_models(&self) -> Vec<LocalModel> {
        lock(&self.local_models).clone()
    }

    /// The local model the app currently transcribes with.
    pub fn current_local_model(&self) -> Option<String> {
        self.catalog.current_model()
    }

    // -----------------------------------------------------------------------
    // Generic writes
    // -----------------------------------------------------------------------

    /// Persist a scalar setting and apply it to the snapshot.
    ///
    /// An unchanged value is skipped unless a write for the same key is
    /// still in flight.  `TranscriptionProviderId` is routed through
    /// [`select_provider`](Self::select_provider).
    pub async fn update_setting(
        &self,
        key: SettingKey,
        value: SettingValue,
    ) -> Result<CommitOutcome, SettingsError> {
        key.check(&value)?;
        if key == SettingKey::TranscriptionProviderId {
            let provider_id = value.as_text().unwrap_or_default().to_string();
            return self.select_provider(&provider_id).await;
        }

        let snapshot = self.require_loaded()?;
        let pending = PendingKey::setting(key);
        if key.read(&snapshot) == value && !self.is_updating_key(&pending) {
            log::debug!("{key} unchanged; skipping write");
            return Ok(CommitOutcome::Skipped(SkipReason::Unchanged));
        }

        let applied = value.clone();
        self.run_commit(pending, self.settings.write(key, value), move |s| {
            key.assign(s, applied)
        })
        .await
    }

    /// Restore a setting to its default, then reload the snapshot.
    pub async fn reset_setting(&self, key: SettingKey) -> Result<(), SettingsError> {
        let guard = self.status.begin(PendingKey::setting(key));
        self.settings
            .reset(key)
            .await
            .map_err(|source| SettingsError::Persist {
                key: guard.key().clone(),
                source,
            })?;
        self.refresh_settings().await
    }

    /// Reload the local model list from the catalog.  Tracked under
    /// [`Operation::LocalModels`]; a failure keeps the previous list.
    pub async fn refresh_local_models(&self) -> Result<Vec<LocalModel>, SettingsError> {
        let _guard = self.status.begin(PendingKey::global(Operation::LocalModels));
        let models = self
            .catalog
            .local_models()
            .await
            .map_err(SettingsError::Load)?;
        *lock(&self.local_models) = models.clone();
        Ok(models)
    }

    // -----------------------------------------------------------------------
    // Internals shared with the commit protocol
    // -----------------------------------------------------------------------

    pub(crate) fn status(&self) -> &AsyncStatusTracker {
        &self.status
    }

    pub(crate) fn require_loaded(&self) -> Result<Arc<ConfigurationSnapshot>, SettingsError> {
        lock(&self.snapshot).clone().ok_or(SettingsError::NotLoaded)
    }

    pub(crate) fn set_model_options(&self, provider_id: &str, models: Vec<String>) {
        lock(&self.model_options).insert(provider_id.to_string(), models);
    }

    /// Build the next snapshot from the current one and swap it in.
    /// Returns `None` (and changes nothing) before the first load.
    pub(crate) fn update_snapshot<R>(
        &self,
        f: impl FnOnce(&mut ConfigurationSnapshot) -> R,
    ) -> Option<R> {
        let mut slot = lock(&self.snapshot);
        let current = slot.as_ref()?;
        let mut next = ConfigurationSnapshot::clone(current);
        let result = f(&mut next);
        *slot = Some(Arc::new(next));
        Some(result)
    }

    /// Bracket `write` with the pending flag for `key`; on success apply the
    /// value with `apply`, unless a newer call for the same key has started.
    pub(crate) async fn run_commit<W, A>(
        &self,
        key: PendingKey,
        write: W,
        apply: A,
    ) -> Result<CommitOutcome, SettingsError>
    where
        W: std::future::Future<Output = Result<(), crate::settings::backend::BackendError>>,
        A: FnOnce(&mut ConfigurationSnapshot),
    {
        let guard = self.status.begin(key);
        if let Err(source) = write.await {
            return Err(SettingsError::Persist {
                key: guard.key().clone(),
                source,
            });
        }
        if !guard.is_latest() {
            log::debug!("{} superseded by a newer call", guard.key());
            return Ok(CommitOutcome::Superseded);
        }
        self.update_snapshot(apply);
        Ok(CommitOutcome::Committed)
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("loaded", &!self.is_loading())
            .field("pending", &self.status.pending_keys())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
