//! Registry of local Whisper models and their on-disk locations.
//!
//! [`LOCAL_MODELS`] lists every GGML model that can serve as the local
//! fallback.  [`ModelPaths`] resolves where a model's file lives given an
//! [`AppPaths`] instance, and [`DiskModelCatalog`] reports the registry to the
//! settings core with each model's download state.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::AppPaths;
use crate::settings::backend::{BackendError, LocalModel, ModelCatalog};

// ---------------------------------------------------------------------------
// ModelInfo
// ---------------------------------------------------------------------------

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// Identifier stored as `cloud_transcription_fallback_model_id`.
    pub id: &'static str,
    /// Name shown in the fallback dropdown.
    pub display_name: &'static str,
    /// File name under the models directory.
    pub file_name: &'static str,
}

pub const LOCAL_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "whisper-base",
        display_name: "Whisper Base",
        file_name: "ggml-base.bin",
    },
    ModelInfo {
        id: "whisper-small",
        display_name: "Whisper Small",
        file_name: "ggml-small.bin",
    },
    ModelInfo {
        id: "whisper-medium",
        display_name: "Whisper Medium",
        file_name: "ggml-medium.bin",
    },
    ModelInfo {
        id: "whisper-large-v3-turbo",
        display_name: "Whisper Large-v3 Turbo",
        file_name: "ggml-large-v3-turbo.bin",
    },
    ModelInfo {
        id: "whisper-large-v3",
        display_name: "Whisper Large-v3",
        file_name: "ggml-large-v3.bin",
    },
];

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Directory that contains (or will contain) GGML `.bin` files.
    pub models_dir: PathBuf,
}

impl ModelPaths {
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    /// Construct directly from a models directory path (useful in tests).
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name)
    }

    /// Returns `true` if the model file exists on disk.
    pub fn is_available(&self, model: &ModelInfo) -> bool {
        self.model_path(model).is_file()
    }

    /// Every registry model that is present on disk.
    pub fn list_local_models(&self) -> Vec<&'static ModelInfo> {
        LOCAL_MODELS.iter().filter(|m| self.is_available(m)).collect()
    }
}

// ---------------------------------------------------------------------------
// DiskModelCatalog
// ---------------------------------------------------------------------------

/// [`ModelCatalog`] backed by the models directory.
#[derive(Debug, Clone)]
pub struct DiskModelCatalog {
    paths: ModelPaths,
    current_model: Option<String>,
}

impl DiskModelCatalog {
    /// `current_model` is the id of the local model the app transcribes with
    /// when it does not use the cloud.
    pub fn new(paths: ModelPaths, current_model: Option<String>) -> Self {
        Self {
            paths,
            current_model,
        }
    }

    /// Use the first downloaded registry model as the current model.
    pub fn detect(paths: ModelPaths) -> Self {
        let current_model = paths.list_local_models().first().map(|m| m.id.to_string());
        match &current_model {
            Some(id) => log::info!("current local model: {id}"),
            None => log::info!("no local model downloaded in {}", paths.models_dir.display()),
        }
        Self::new(paths, current_model)
    }

    fn scan(&self) -> Vec<LocalModel> {
        LOCAL_MODELS
            .iter()
            .map(|m| LocalModel {
                id: m.id.to_string(),
                name: m.display_name.to_string(),
                is_downloaded: self.paths.is_available(m),
            })
            .collect()
    }
}

#[async_trait]
impl ModelCatalog for DiskModelCatalog {
    async fn local_models(&self) -> Result<Vec<LocalModel>, BackendError> {
        let catalog = self.clone();
        let models = tokio::task::spawn_blocking(move || catalog.scan())
            .await
            .map_err(|e| BackendError::Storage(e.to_string()))?;
        log::info!(
            "{} of {} local models downloaded in {}",
            models.iter().filter(|m| m.is_downloaded).count(),
            models.len(),
            self.paths.models_dir.display()
        );
        Ok(models)
    }

    fn current_model(&self) -> Option<String> {
        self.current_model.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn registry_ids_are_unique() {
        let mut ids: Vec<_> = LOCAL_MODELS.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), LOCAL_MODELS.len());
    }

    #[test]
    fn model_paths_non_existent_returns_false() {
        let mp = ModelPaths::new("/nonexistent/path");
        assert!(!mp.is_available(&LOCAL_MODELS[0]));
        assert!(mp.list_local_models().is_empty());
    }

    #[test]
    fn model_paths_correct_file_name() {
        let mp = ModelPaths::new("/models");
        let p = mp.model_path(&LOCAL_MODELS[1]);
        assert!(p.ends_with("ggml-small.bin"));
    }

    #[tokio::test]
    async fn catalog_marks_files_on_disk_as_downloaded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-small.bin"), b"ggml").unwrap();
        // A directory with a model's file name does not count.
        std::fs::create_dir(dir.path().join("ggml-medium.bin")).unwrap();

        let catalog = DiskModelCatalog::new(ModelPaths::new(dir.path()), None);
        let models = catalog.local_models().await.unwrap();

        assert_eq!(models.len(), LOCAL_MODELS.len());
        let downloaded: Vec<_> = models
            .iter()
            .filter(|m| m.is_downloaded)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(downloaded, vec!["whisper-small"]);
        assert_eq!(
            models.iter().find(|m| m.id == "whisper-small").map(|m| m.name.as_str()),
            Some("Whisper Small")
        );
    }

    #[test]
    fn detect_picks_first_downloaded_model() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ggml-large-v3.bin"), b"ggml").unwrap();
        std::fs::write(dir.path().join("ggml-medium.bin"), b"ggml").unwrap();

        let catalog = DiskModelCatalog::detect(ModelPaths::new(dir.path()));
        assert_eq!(catalog.current_model().as_deref(), Some("whisper-medium"));

        let empty = tempdir().unwrap();
        let catalog = DiskModelCatalog::detect(ModelPaths::new(empty.path()));
        assert_eq!(catalog.current_model(), None);
    }

    #[test]
    fn current_model_is_reported() {
        let catalog = DiskModelCatalog::new(ModelPaths::new("/models"), Some("whisper-base".into()));
        assert_eq!(catalog.current_model().as_deref(), Some("whisper-base"));
    }
}
