//! Persisted cloud-transcription settings, defaults and TOML persistence.
//!
//! [`ConfigurationSnapshot`] is the whole persisted state the settings core
//! reads from.  It is a plain value: the store never mutates one in place,
//! it builds a new snapshot and swaps it in.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Provider id used when no provider is configured at all.
pub const DEFAULT_PROVIDER_ID: &str = "groq";

/// Reserved id of the user-defined, OpenAI-compatible provider.  It is the
/// only built-in provider whose base URL may be edited.
pub const CUSTOM_PROVIDER_ID: &str = "custom";

// ---------------------------------------------------------------------------
// ProviderDescriptor
// ---------------------------------------------------------------------------

/// One transcription service endpoint.  Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable identifier, also the scope of per-provider keys and models.
    pub id: String,
    /// Human-readable name for the provider dropdown.
    pub label: String,
    /// Root of the OpenAI-compatible API (e.g. `https://api.groq.com/openai/v1`).
    pub base_url: String,
    /// Whether the user may edit `base_url`.
    #[serde(default)]
    pub allow_base_url_edit: bool,
}

impl ProviderDescriptor {
    fn builtin(id: &str, label: &str, base_url: &str, allow_base_url_edit: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            base_url: base_url.into(),
            allow_base_url_edit,
        }
    }
}

/// Built-in provider list.  The custom provider always comes last.
pub fn default_providers() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::builtin("groq", "Groq", "https://api.groq.com/openai/v1", false),
        ProviderDescriptor::builtin("openai", "OpenAI", "https://api.openai.com/v1", false),
        ProviderDescriptor::builtin(
            CUSTOM_PROVIDER_ID,
            "Custom",
            "http://localhost:8000/v1",
            true,
        ),
    ]
}

/// Model preselected for a built-in provider on first run.
pub fn default_model_for_provider(provider_id: &str) -> &'static str {
    match provider_id {
        "groq" => "whisper-large-v3-turbo",
        "openai" => "whisper-1",
        _ => "",
    }
}

fn default_api_keys() -> HashMap<String, String> {
    default_providers()
        .into_iter()
        .map(|p| (p.id, String::new()))
        .collect()
}

fn default_models() -> HashMap<String, String> {
    default_providers()
        .into_iter()
        .map(|p| {
            let model = default_model_for_provider(&p.id).to_string();
            (p.id, model)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ConfigurationSnapshot
// ---------------------------------------------------------------------------

/// Every persisted cloud-transcription setting, serialised as
/// `transcription.toml`.
///
/// Scalar fields come first so the TOML output keeps plain values ahead of
/// the provider tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationSnapshot {
    /// Master switch for cloud transcription.
    pub cloud_transcription_enabled: bool,
    /// Selected provider.  Empty means "first provider in the list".
    pub transcription_provider_id: String,
    /// Use a local model when the cloud provider fails.
    pub cloud_transcription_fallback_enabled: bool,
    /// Local model used as fallback.  Empty means "the current local model".
    pub cloud_transcription_fallback_model_id: String,
    /// API key per provider id.
    pub transcription_api_keys: HashMap<String, String>,
    /// Selected model per provider id.
    pub transcription_models: HashMap<String, String>,
    /// Ordered provider list offered in the provider dropdown.
    pub transcription_providers: Vec<ProviderDescriptor>,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        Self {
            cloud_transcription_enabled: false,
            transcription_provider_id: String::new(),
            cloud_transcription_fallback_enabled: false,
            cloud_transcription_fallback_model_id: String::new(),
            transcription_api_keys: default_api_keys(),
            transcription_models: default_models(),
            transcription_providers: default_providers(),
        }
    }
}

impl ConfigurationSnapshot {
    /// A snapshot with no providers and no scoped values.  This is what the
    /// store holds before the first load completes.
    pub fn empty() -> Self {
        Self {
            transcription_api_keys: HashMap::new(),
            transcription_models: HashMap::new(),
            transcription_providers: Vec::new(),
            ..Self::default()
        }
    }

    /// Load from the platform-appropriate `transcription.toml`.
    ///
    /// Returns `Ok(ConfigurationSnapshot::default())` when the file does not
    /// exist yet (first run).
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let snapshot: Self = toml::from_str(&content)?;
        Ok(snapshot)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
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
    fn default_values() {
        let cfg = ConfigurationSnapshot::default();

        assert!(!cfg.cloud_transcription_enabled);
        assert!(cfg.transcription_provider_id.is_empty());
        assert!(!cfg.cloud_transcription_fallback_enabled);
        assert!(cfg.cloud_transcription_fallback_model_id.is_empty());

        let ids: Vec<_> = cfg
            .transcription_providers
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["groq", "openai", "custom"]);

        let editable: Vec<_> = cfg
            .transcription_providers
            .iter()
            .filter(|p| p.allow_base_url_edit)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(editable, vec![CUSTOM_PROVIDER_ID]);

        assert_eq!(cfg.transcription_api_keys.get("groq").map(String::as_str), Some(""));
        assert_eq!(
            cfg.transcription_models.get("groq").map(String::as_str),
            Some("whisper-large-v3-turbo")
        );
        assert_eq!(cfg.transcription_models.get("custom").map(String::as_str), Some(""));
    }

    #[test]
    fn empty_has_no_providers() {
        let cfg = ConfigurationSnapshot::empty();
        assert!(cfg.transcription_providers.is_empty());
        assert!(cfg.transcription_api_keys.is_empty());
        assert!(cfg.transcription_models.is_empty());
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let cfg = ConfigurationSnapshot::load_from(&path).expect("should not error");
        assert_eq!(cfg, ConfigurationSnapshot::default());
    }

    #[test]
    fn modified_values_survive_save_and_load() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("transcription.toml");

        let mut cfg = ConfigurationSnapshot::default();
        cfg.cloud_transcription_enabled = true;
        cfg.transcription_provider_id = "custom".into();
        cfg.cloud_transcription_fallback_enabled = true;
        cfg.cloud_transcription_fallback_model_id = "whisper-small".into();
        cfg.transcription_api_keys.insert("groq".into(), "gsk-test".into());
        cfg.transcription_models.insert("custom".into(), "my-whisper".into());
        cfg.transcription_providers[2].base_url = "http://10.0.0.5:9000/v1".into();

        cfg.save_to(&path).expect("save");
        let loaded = ConfigurationSnapshot::load_from(&path).expect("load");

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("transcription.toml");
        std::fs::write(&path, "cloud_transcription_enabled = true\n").expect("write");

        let cfg = ConfigurationSnapshot::load_from(&path).expect("load");
        assert!(cfg.cloud_transcription_enabled);
        assert_eq!(cfg.transcription_providers, default_providers());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("transcription.toml");
        std::fs::write(&path, "cloud_transcription_enabled = \"yes\"\n").expect("write");

        assert!(ConfigurationSnapshot::load_from(&path).is_err());
    }
}
