//! `TranscriptionClient`: uploads recorded audio to the selected provider.
//!
//! Samples are encoded as a 16 kHz mono 16-bit PCM WAV file and posted as
//! `multipart/form-data` to `{base_url}/audio/transcriptions`, or to
//! `{base_url}/audio/translations` when the text should come back in
//! English.  The response is expected as `{"text": …}`.

use std::io::Cursor;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::remote::{build_client, check_status, endpoint_url, with_auth};
use crate::settings::backend::BackendError;
use crate::settings::resolver::CloudTarget;

/// Per-request timeout used by [`TranscriptionClient::new`].  Uploads of
/// long recordings need more time than a model listing.
pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 120;

const SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for transcription and translation requests.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: reqwest::Client,
}

impl TranscriptionClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(TRANSCRIBE_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
        }
    }

    /// Transcribe `samples` (mono, 16 kHz, `[-1.0, 1.0]`) with `target`.
    ///
    /// With `translate` set the translation endpoint is used and `language`
    /// is not sent.  A blank `language` or `prompt` is left out of the form.
    pub async fn transcribe(
        &self,
        target: &CloudTarget,
        samples: &[f32],
        language: Option<&str>,
        prompt: Option<&str>,
        translate: bool,
    ) -> Result<String, BackendError> {
        let url = transcription_url(&target.base_url, translate);
        log::debug!(
            "sending {} samples to {url} ({})",
            samples.len(),
            target.provider_id
        );

        let wav = encode_wav(samples)?;
        let file = Part::bytes(wav).file_name("audio.wav").mime_str("audio/wav")?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", target.model.clone());
        if let Some(language) = non_blank(language) {
            if !translate {
                form = form.text("language", language.to_string());
            }
        }
        if let Some(prompt) = non_blank(prompt) {
            form = form.text("prompt", prompt.to_string());
        }
        form = form.text("response_format", "json");

        let response = with_auth(self.client.post(&url), &target.api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response, &url).await?;

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        log::info!("received {} characters from {url}", parsed.text.len());
        Ok(parsed.text)
    }
}

impl Default for TranscriptionClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transcription_url(base_url: &str, translate: bool) -> String {
    let path = if translate {
        "audio/translations"
    } else {
        "audio/transcriptions"
    };
    endpoint_url(base_url, path)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Encode `samples` as an in-memory 16 kHz mono 16-bit WAV file.  Samples
/// outside `[-1.0, 1.0]` are clipped.
pub fn encode_wav(samples: &[f32]) -> Result<Vec<u8>, BackendError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let audio_err = |e: hound::Error| BackendError::Audio(e.to_string());
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut buffer, spec).map_err(audio_err)?;
    for &sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(pcm).map_err(audio_err)?;
    }
    writer.finalize().map_err(audio_err)?;

    Ok(buffer.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
