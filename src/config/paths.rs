//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\cloud-stt-settings\
//!   macOS:   ~/Library/Application Support/cloud-stt-settings/
//!   Linux:   ~/.config/cloud-stt-settings/
//!
//! Data dir (local fallback models):
//!   Windows: %LOCALAPPDATA%\cloud-stt-settings\
//!   macOS:   ~/Library/Application Support/cloud-stt-settings/
//!   Linux:   ~/.local/share/cloud-stt-settings/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `transcription.toml`.
    pub config_dir: PathBuf,
    /// Full path to `transcription.toml`.
    pub settings_file: PathBuf,
    /// Directory for downloaded GGML model files used as local fallback.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "cloud-stt-settings";
    const SETTINGS_FILE: &'static str = "transcription.toml";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::with_dirs(config_dir, data_dir)
    }

    /// Lay out the same files under explicit directories (tests, portable
    /// installs).
    pub fn with_dirs(config_dir: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        let settings_file = config_dir.join(Self::SETTINGS_FILE);
        let models_dir = data_dir.as_ref().join("models");

        Self {
            config_dir,
            settings_file,
            models_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
