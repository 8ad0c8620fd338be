//! `FileBackend`: settings persisted to `transcription.toml`.
//!
//! Implements both [`SettingsBackend`] and [`ProviderBackend`].  Every write
//! edits a copy of the in-memory snapshot, saves the copy to disk, and only
//! then replaces the in-memory snapshot, so a failed save changes nothing.
//! Writes are serialised by an async mutex held across the save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::{ConfigurationSnapshot, ProviderDescriptor};
use crate::remote::ModelListClient;
use crate::settings::backend::{BackendError, ProviderBackend, SettingsBackend};
use crate::settings::keys::{SettingKey, SettingValue};

pub struct FileBackend {
    path: PathBuf,
    state: Mutex<ConfigurationSnapshot>,
    client: ModelListClient,
}

impl FileBackend {
    /// Open the settings file at `path`.  A missing file yields the default
    /// settings; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let snapshot = ConfigurationSnapshot::load_from(&path)?;
        log::info!("settings loaded from {}", path.display());
        Ok(Self {
            path,
            state: Mutex::new(snapshot),
            client: ModelListClient::new(),
        })
    }

    pub fn with_client(mut self, client: ModelListClient) -> Self {
        self.client = client;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `edit` to a copy of the current settings, persist it, then make
    /// it current.
    async fn mutate<F>(&self, edit: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut ConfigurationSnapshot) -> Result<(), BackendError>,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        edit(&mut next)?;

        let path = self.path.clone();
        let to_save = next.clone();
        tokio::task::spawn_blocking(move || to_save.save_to(&path))
            .await
            .map_err(|e| BackendError::Storage(e.to_string()))?
            .map_err(|e| BackendError::Storage(format!("{e:#}")))?;

        *state = next;
        Ok(())
    }
}

fn provider_mut<'a>(
    snapshot: &'a mut ConfigurationSnapshot,
    provider_id: &str,
) -> Result<&'a mut ProviderDescriptor, BackendError> {
    snapshot
        .transcription_providers
        .iter_mut()
        .find(|p| p.id == provider_id)
        .ok_or_else(|| BackendError::UnknownProvider(provider_id.to_string()))
}

#[async_trait]
impl SettingsBackend for FileBackend {
    /// Re-read the file so edits made outside the process are picked up.
    async fn load(&self) -> Result<ConfigurationSnapshot, BackendError> {
        let mut state = self.state.lock().await;
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || ConfigurationSnapshot::load_from(&path))
            .await
            .map_err(|e| BackendError::Storage(e.to_string()))?
            .map_err(|e| BackendError::Storage(format!("{e:#}")))?;
        *state = loaded.clone();
        Ok(loaded)
    }

    async fn write(&self, key: SettingKey, value: SettingValue) -> Result<(), BackendError> {
        self.mutate(|s| {
            key.apply(s, value)
                .map_err(|e| BackendError::Rejected(e.to_string()))
        })
        .await?;
        log::info!("{key} saved");
        Ok(())
    }

    async fn reset(&self, key: SettingKey) -> Result<(), BackendError> {
        let default = key.read(&ConfigurationSnapshot::default());
        self.mutate(|s| {
            key.apply(s, default)
                .map_err(|e| BackendError::Rejected(e.to_string()))
        })
        .await?;
        log::info!("{key} reset to default");
        Ok(())
    }
}

#[async_trait]
impl ProviderBackend for FileBackend {
    async fn set_active_provider(&self, provider_id: &str) -> Result<(), BackendError> {
        self.mutate(|s| {
            provider_mut(s, provider_id)?;
            s.transcription_provider_id = provider_id.to_string();
            Ok(())
        })
        .await?;
        log::info!("active transcription provider set to '{provider_id}'");
        Ok(())
    }

    async fn set_provider_base_url(&self, provider_id: &str, url: &str) -> Result<(), BackendError> {
        self.mutate(|s| {
            let provider = provider_mut(s, provider_id)?;
            if !provider.allow_base_url_edit {
                return Err(BackendError::NotEditable(provider_id.to_string()));
            }
            provider.base_url = url.to_string();
            Ok(())
        })
        .await
    }

    async fn set_provider_api_key(&self, provider_id: &str, key: &str) -> Result<(), BackendError> {
        self.mutate(|s| {
            provider_mut(s, provider_id)?;
            s.transcription_api_keys
                .insert(provider_id.to_string(), key.to_string());
            Ok(())
        })
        .await
    }

    async fn set_provider_model(&self, provider_id: &str, model: &str) -> Result<(), BackendError> {
        self.mutate(|s| {
            provider_mut(s, provider_id)?;
            s.transcription_models
                .insert(provider_id.to_string(), model.to_string());
            Ok(())
        })
        .await
    }

    async fn list_provider_models(&self, provider_id: &str) -> Result<Vec<String>, BackendError> {
        let (base_url, api_key) = {
            let state = self.state.lock().await;
            let provider = state
                .transcription_providers
                .iter()
                .find(|p| p.id == provider_id)
                .ok_or_else(|| BackendError::UnknownProvider(provider_id.to_string()))?;
            let api_key = state
                .transcription_api_keys
                .get(provider_id)
                .cloned()
                .unwrap_or_default();
            (provider.base_url.clone(), api_key)
        };
        self.client.list_models(&base_url, &api_key).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn reopen(path: &Path) -> ConfigurationSnapshot {
        ConfigurationSnapshot::load_from(path).unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("transcription.toml")).unwrap();

        let loaded = backend.load().await.unwrap();
        assert_eq!(loaded, ConfigurationSnapshot::default());
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn writes_reach_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("transcription.toml");
        let backend = FileBackend::open(&path).unwrap();

        backend
            .write(SettingKey::CloudTranscriptionEnabled, true.into())
            .await
            .unwrap();
        backend.set_active_provider("openai").await.unwrap();
        backend.set_provider_api_key("openai", "sk-1").await.unwrap();
        backend.set_provider_model("openai", "gpt-4o-transcribe").await.unwrap();
        backend
            .set_provider_base_url("custom", "http://10.0.0.5:9000/v1")
            .await
            .unwrap();

        let on_disk = reopen(&path);
        assert!(on_disk.cloud_transcription_enabled);
        assert_eq!(on_disk.transcription_provider_id, "openai");
        assert_eq!(on_disk.transcription_api_keys["openai"], "sk-1");
        assert_eq!(on_disk.transcription_models["openai"], "gpt-4o-transcribe");
        let custom = on_disk
            .transcription_providers
            .iter()
            .find(|p| p.id == "custom")
            .unwrap();
        assert_eq!(custom.base_url, "http://10.0.0.5:9000/v1");
    }

    #[tokio::test]
    async fn rejects_unknown_provider_and_fixed_base_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transcription.toml");
        let backend = FileBackend::open(&path).unwrap();

        assert_eq!(
            backend.set_active_provider("acme").await.unwrap_err(),
            BackendError::UnknownProvider("acme".into())
        );
        assert_eq!(
            backend
                .set_provider_base_url("groq", "https://proxy/v1")
                .await
                .unwrap_err(),
            BackendError::NotEditable("groq".into())
        );
        assert_eq!(
            backend.list_provider_models("acme").await.unwrap_err(),
            BackendError::UnknownProvider("acme".into())
        );
        // Nothing was saved.
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reset_restores_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transcription.toml");
        let backend = FileBackend::open(&path).unwrap();

        backend
            .write(
                SettingKey::CloudTranscriptionFallbackModelId,
                "whisper-small".into(),
            )
            .await
            .unwrap();
        backend
            .reset(SettingKey::CloudTranscriptionFallbackModelId)
            .await
            .unwrap();

        assert_eq!(reopen(&path).cloud_transcription_fallback_model_id, "");
    }

    #[tokio::test]
    async fn load_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transcription.toml");
        let backend = FileBackend::open(&path).unwrap();

        let mut edited = ConfigurationSnapshot::default();
        edited.cloud_transcription_fallback_enabled = true;
        edited.save_to(&path).unwrap();

        assert!(backend.load().await.unwrap().cloud_transcription_fallback_enabled);
    }

    #[tokio::test]
    async fn failed_save_leaves_state_unchanged() {
        let dir = tempdir().unwrap();
        // The parent "directory" is a file, so saving must fail.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let backend = FileBackend::open(blocker.join("transcription.toml")).unwrap();

        let err = backend
            .write(SettingKey::CloudTranscriptionEnabled, true.into())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Storage(_)));

        let state = backend.state.lock().await;
        assert!(!state.cloud_transcription_enabled);
    }

    #[tokio::test]
    async fn store_round_trip_through_file() {
        use std::sync::Arc;

        use crate::settings::{CommitOutcome, SettingsStore, StaticCatalog};

        let dir = tempdir().unwrap();
        let path = dir.path().join("transcription.toml");
        let backend = Arc::new(FileBackend::open(&path).unwrap());
        let store = SettingsStore::with_backend(backend, Arc::new(StaticCatalog::new(&[])));
        store.initialize().await.unwrap();

        assert_eq!(
            store.commit_api_key("groq", " gsk-live ").await.unwrap(),
            CommitOutcome::Committed
        );
        assert_eq!(reopen(&path).transcription_api_keys["groq"], "gsk-live");
    }
}
