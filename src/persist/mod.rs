//! Settings persistence.

pub mod file;

pub use file::FileBackend;
