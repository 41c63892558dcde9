//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a hand-written `settings.toml`
//! only needs the keys it wants to override.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::language::DEFAULT_LANGUAGE;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection settings for the advisory backend (`POST /api/ask`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Maximum seconds to wait for an answer before treating the backend as
    /// unavailable.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the LibreTranslate-compatible translation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Base URL of the service (`/translate` is appended).
    pub base_url: String,
    /// API key — `None` for public or self-hosted instances without keys.
    pub api_key: Option<String>,
    /// Send `"auto"` as the source language and let the service detect it.
    pub detect_source: bool,
    /// Maximum seconds to wait for a single translation call.
    pub timeout_secs: u64,
    /// Retry a failed translation call once before falling back.
    pub retry_once: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://libretranslate.de".into(),
            api_key: None,
            detect_source: true,
            timeout_secs: 10,
            retry_once: false,
        }
    }
}

impl TranslationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Speech capture and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Read every assistant answer aloud.
    pub speak_responses: bool,
    /// espeak-compatible synthesizer program looked up on `PATH`.
    pub synthesizer: String,
    /// Speaking rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Words per minute at `rate == 1.0`.
    pub words_per_minute: u32,
    /// Length of a single voice capture, in seconds.
    pub capture_secs: f32,
    /// Upper bound on capture + transcription before the capture is abandoned.
    pub capture_timeout_secs: u64,
    /// GGML Whisper model name (file stem under the models directory).
    pub whisper_model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            speak_responses: true,
            synthesizer: "espeak-ng".into(),
            rate: 1.0,
            words_per_minute: 175,
            capture_secs: 6.0,
            capture_timeout_secs: 20,
            whisper_model: "ggml-base".into(),
        }
    }
}

impl SpeechConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use kisan_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Conversation language selected at startup.
    pub language: String,
    /// Language the backend understands; questions are translated into it.
    pub pivot_language: String,
    /// Advisory backend settings.
    pub backend: BackendConfig,
    /// Translation service settings.
    pub translation: TranslationConfig,
    /// Speech capture / synthesis settings.
    pub speech: SpeechConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.into(),
            pivot_language: "en".into(),
            backend: BackendConfig::default(),
            translation: TranslationConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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
        let cfg = AppConfig::default();

        assert_eq!(cfg.language, "en");
        assert_eq!(cfg.pivot_language, "en");
        assert_eq!(cfg.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.translation.base_url, "https://libretranslate.de");
        assert!(cfg.translation.api_key.is_none());
        assert!(cfg.translation.detect_source);
        assert!(!cfg.translation.retry_once);
        assert!(cfg.speech.speak_responses);
        assert_eq!(cfg.speech.synthesizer, "espeak-ng");
        assert!((cfg.speech.rate - 1.0).abs() < f32::EPSILON);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.language, AppConfig::default().language);
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.language = "kn".into();
        cfg.backend.base_url = "https://advisor.example.org".into();
        cfg.translation.api_key = Some("lt-key".into());
        cfg.translation.retry_once = true;
        cfg.speech.speak_responses = false;
        cfg.speech.rate = 0.8;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.language, "kn");
        assert_eq!(loaded.backend.base_url, "https://advisor.example.org");
        assert_eq!(loaded.translation.api_key.as_deref(), Some("lt-key"));
        assert!(loaded.translation.retry_once);
        assert!(!loaded.speech.speak_responses);
        assert!((loaded.speech.rate - 0.8).abs() < 1e-6);
    }

    /// A partial file only overrides the keys it names.
    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "language = \"ta\"\n\n[backend]\nbase_url = \"http://10.0.0.5:8000\"\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.language, "ta");
        assert_eq!(cfg.backend.base_url, "http://10.0.0.5:8000");
        assert_eq!(cfg.backend.timeout_secs, 30);
        assert_eq!(cfg.translation.timeout_secs, 10);
        assert_eq!(cfg.speech.whisper_model, "ggml-base");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "language = [").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }
}
