//! Cloud transcription provider settings.
//!
//! * [`config`]   persisted settings, defaults and platform paths
//! * [`settings`] the store, provider resolution and commit protocol
//! * [`catalog`]  local Whisper models usable as fallback
//! * [`remote`]   provider model listing and transcription over HTTP
//! * [`persist`]  TOML-file backend

pub mod catalog;
pub mod config;
pub mod persist;
pub mod remote;
pub mod settings;
