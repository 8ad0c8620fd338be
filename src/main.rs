//! Command-line entry point.
//!
//! ```text
//! cloud-stt-settings                  print the current settings view
//! cloud-stt-settings refresh-models   also fetch the selected provider's models
//! cloud-stt-settings transcribe FILE   transcribe a 16 kHz mono WAV file
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Resolve [`AppPaths`] and open the settings file.
//! 3. Build the [`SettingsStore`] and load settings and local models.
//! 4. Optionally refresh the provider model list.
//! 5. Print the derived view, or transcribe the given file with the
//!    selected provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use cloud_stt_settings::{
    catalog::{DiskModelCatalog, ModelPaths},
    config::AppPaths,
    persist::FileBackend,
    remote::TranscriptionClient,
    settings::{cloud_target, CloudTranscriptionView, SettingsStore},
};

enum Command {
    Show,
    RefreshModels,
    Transcribe(PathBuf),
}

fn parse_command() -> anyhow::Result<Command> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => Ok(Command::Show),
        Some("refresh-models") => Ok(Command::RefreshModels),
        Some("transcribe") => {
            let file = args.next().context("usage: transcribe FILE")?;
            Ok(Command::Transcribe(PathBuf::from(file)))
        }
        Some(other) => anyhow::bail!(
            "unknown command '{other}' (expected 'refresh-models' or 'transcribe')"
        ),
    }
}

/// Read a 16 kHz mono WAV file as `f32` samples.
fn read_samples(path: &Path) -> anyhow::Result<Vec<f32>> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.sample_rate != 16_000 {
        anyhow::bail!(
            "{} is {} Hz with {} channels; expected 16000 Hz mono",
            path.display(),
            spec.sample_rate,
            spec.channels
        );
    }
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

fn print_view(view: &CloudTranscriptionView) {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let provider = &view.provider;

    println!("Cloud transcription: {}", on_off(view.enabled));
    println!(
        "Provider:            {} ({})",
        provider
            .selected_provider
            .as_ref()
            .map(|p| p.label.as_str())
            .unwrap_or("-"),
        provider.selected_provider_id
    );
    if provider.show_base_url {
        println!("Base URL:            {}", provider.base_url);
    }
    println!(
        "API key:             {}",
        if provider.api_key.is_empty() { "(not set)" } else { "(set)" }
    );
    println!("Model:               {}", provider.model);
    if !provider.model_options.is_empty() {
        println!("Available models:    {}", provider.model_options.join(", "));
    }

    let fallback = &view.fallback;
    println!("Local fallback:      {}", on_off(fallback.enabled));
    println!(
        "Fallback model:      {}",
        fallback.selected.as_deref().unwrap_or("-")
    );
    if fallback.show_empty_notice {
        println!("                     no local model downloaded");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = parse_command()?;

    // 2. Paths and backend
    let paths = AppPaths::new();
    let backend = Arc::new(
        FileBackend::open(&paths.settings_file)
            .with_context(|| format!("opening {}", paths.settings_file.display()))?,
    );
    let catalog = Arc::new(DiskModelCatalog::detect(ModelPaths::from_app_paths(&paths)));

    // 3. Store
    let store = SettingsStore::with_backend(backend, catalog);
    store.initialize().await?;
    if let Err(e) = store.refresh_local_models().await {
        log::warn!("could not list local models: {e}");
    }

    // 4. Provider models
    if matches!(command, Command::RefreshModels) {
        let provider_id = store.provider_view().selected_provider_id;
        match store.refresh_models(&provider_id).await {
            Ok(models) => log::info!("{} models available from '{provider_id}'", models.len()),
            Err(e) => log::warn!("{e}"),
        }
    }

    let snapshot = store.snapshot();

    // 5. Output
    if let Command::Transcribe(path) = &command {
        let target = cloud_target(&snapshot).context("cloud transcription is off")?;
        let samples = read_samples(path)?;
        let text = TranscriptionClient::new()
            .transcribe(&target, &samples, None, None, false)
            .await?;
        println!("{text}");
        return Ok(());
    }

    print_view(&store.view());

    match cloud_target(&snapshot) {
        Some(target) => log::info!("transcribing via {} ({})", target.base_url, target.model),
        None => log::info!("cloud transcription is off"),
    }
    if let Some(model) = store.fallback_model() {
        log::info!("local fallback model: {model}");
    }

    Ok(())
}
