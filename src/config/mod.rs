//! Configuration module for cloud transcription settings.
//!
//! Provides [`ConfigurationSnapshot`] (every persisted setting),
//! [`ProviderDescriptor`], the built-in provider list, [`AppPaths`] for
//! cross-platform directories, and TOML persistence via
//! `ConfigurationSnapshot::load_from` / `ConfigurationSnapshot::save_to`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    default_model_for_provider, default_providers, ConfigurationSnapshot, ProviderDescriptor,
    CUSTOM_PROVIDER_ID, DEFAULT_PROVIDER_ID,
};
