//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\kisan-assistant\
//!   macOS:   ~/Library/Application Support/kisan-assistant/
//!   Linux:   ~/.config/kisan-assistant/
//!
//! Data dir (speech models):
//!   Windows: %LOCALAPPDATA%\kisan-assistant\
//!   macOS:   ~/Library/Application Support/kisan-assistant/
//!   Linux:   ~/.local/share/kisan-assistant/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for downloaded GGML speech-recognition models.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "kisan-assistant";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            models_dir,
        }
    }

    /// Full path of the GGML file for a Whisper model name (`"ggml-base"`).
    pub fn whisper_model(&self, name: &str) -> PathBuf {
        self.models_dir.join(format!("{name}.bin"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
