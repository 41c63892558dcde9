//! Configuration module for the farmer assistant.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the backend,
//! translation service and speech capabilities, `AppPaths` for cross-platform
//! data directories, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, BackendConfig, SpeechConfig, TranslationConfig};
