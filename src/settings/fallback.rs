//! Local fallback model selection.
//!
//! Only downloaded models are ever offered.  A stored fallback id whose
//! model has since been deleted stays in storage untouched until the user
//! picks another one; it is simply not offered and not used.

use crate::config::ConfigurationSnapshot;
use crate::settings::backend::LocalModel;
use crate::settings::view::SelectOption;

/// Dropdown entries for every downloaded model, in catalog order.
pub fn fallback_options(models: &[LocalModel]) -> Vec<SelectOption> {
    models
        .iter()
        .filter(|m| m.is_downloaded)
        .map(|m| SelectOption {
            value: m.id.clone(),
            label: m.name.clone(),
        })
        .collect()
}

pub fn is_downloaded(models: &[LocalModel], model_id: &str) -> bool {
    models.iter().any(|m| m.is_downloaded && m.id == model_id)
}

/// Value shown as selected: the stored id, else the model the app currently
/// uses locally, else nothing.
pub fn displayed_selection(stored: &str, current_model: Option<&str>) -> Option<String> {
    if !stored.is_empty() {
        return Some(stored.to_string());
    }
    current_model
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Local model to transcribe with when the cloud provider fails.
///
/// Resolves like [`displayed_selection`] (stored id, else `current_model`),
/// then requires the model to be downloaded.  `None` when fallback is off.
pub fn fallback_model<'a>(
    snapshot: &'a ConfigurationSnapshot,
    models: &[LocalModel],
    current_model: Option<&'a str>,
) -> Option<&'a str> {
    if !snapshot.cloud_transcription_fallback_enabled {
        return None;
    }
    let stored = snapshot.cloud_transcription_fallback_model_id.as_str();
    let id = if stored.is_empty() { current_model? } else { stored };
    (!id.is_empty() && is_downloaded(models, id)).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<LocalModel> {
        [("whisper-small", true), ("whisper-medium", false), ("whisper-large-v3", true)]
            .iter()
            .map(|(id, downloaded)| LocalModel {
                id: id.to_string(),
                name: id.to_uppercase(),
                is_downloaded: *downloaded,
            })
            .collect()
    }

    #[test]
    fn options_exclude_models_not_downloaded() {
        let values: Vec<_> = fallback_options(&models())
            .into_iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec!["whisper-small", "whisper-large-v3"]);
    }

    #[test]
    fn stored_but_deleted_model_is_not_offered() {
        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.cloud_transcription_fallback_enabled = true;
        snapshot.cloud_transcription_fallback_model_id = "whisper-medium".into();

        let options = fallback_options(&models());
        assert!(options.iter().all(|o| o.value != "whisper-medium"));
        assert_eq!(fallback_model(&snapshot, &models(), Some("whisper-small")), None);
        // Storage keeps the id.
        assert_eq!(snapshot.cloud_transcription_fallback_model_id, "whisper-medium");
    }

    #[test]
    fn fallback_model_requires_enabled_and_downloaded() {
        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.cloud_transcription_fallback_model_id = "whisper-small".into();
        assert_eq!(fallback_model(&snapshot, &models(), None), None);

        snapshot.cloud_transcription_fallback_enabled = true;
        assert_eq!(fallback_model(&snapshot, &models(), None), Some("whisper-small"));
    }

    #[test]
    fn empty_stored_id_falls_back_to_current_model() {
        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.cloud_transcription_fallback_enabled = true;

        assert_eq!(
            fallback_model(&snapshot, &models(), Some("whisper-large-v3")),
            Some("whisper-large-v3")
        );
        // The current model must be downloaded too.
        assert_eq!(fallback_model(&snapshot, &models(), Some("whisper-medium")), None);
        assert_eq!(fallback_model(&snapshot, &models(), Some("")), None);
        assert_eq!(fallback_model(&snapshot, &models(), None), None);
    }

    #[test]
    fn selection_prefers_stored_then_current() {
        assert_eq!(
            displayed_selection("whisper-small", Some("whisper-large-v3")),
            Some("whisper-small".into())
        );
        assert_eq!(
            displayed_selection("", Some("whisper-large-v3")),
            Some("whisper-large-v3".into())
        );
        assert_eq!(displayed_selection("", Some("")), None);
        assert_eq!(displayed_selection("", None), None);
    }
}
