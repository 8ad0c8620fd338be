//! Local Whisper models that can serve as the cloud fallback.
//!
//! The catalog only reports what is on disk; downloading models is handled
//! elsewhere.

pub mod model;

pub use model::{DiskModelCatalog, ModelInfo, ModelPaths, LOCAL_MODELS};
