//! Speech output bridge — fire-and-forget synthesis.
//!
//! [`SpeechOutputBridge::speak`] never blocks and never fails: the utterance
//! runs on a background task, failures are logged, and an unavailable
//! synthesizer turns the call into a no-op. Starting a new utterance aborts
//! the one still in progress.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::{CommandSynthesizer, SpeechError};
use crate::config::SpeechConfig;
use crate::language;

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// A speech-synthesis capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in `locale_tag` at `rate` (1.0 = normal); resolves when
    /// the utterance has finished.
    async fn speak(&self, text: &str, locale_tag: &str, rate: f32) -> Result<(), SpeechError>;
}

// ---------------------------------------------------------------------------
// SpeechOutput
// ---------------------------------------------------------------------------

/// Speech-synthesis capability, resolved once at startup.
#[derive(Clone)]
pub enum SpeechOutput {
    Available(Arc<dyn SpeechSynthesizer>),
    Unavailable,
}

impl SpeechOutput {
    /// Look for the configured synthesizer program on `PATH`.
    pub fn detect(config: &SpeechConfig) -> Self {
        match CommandSynthesizer::detect(&config.synthesizer, config.words_per_minute) {
            Some(synth) => {
                log::info!("speech: synthesis via {}", synth.program().display());
                SpeechOutput::Available(Arc::new(synth))
            }
            None => {
                log::info!(
                    "speech: `{}` not found on PATH; answers will not be spoken",
                    config.synthesizer
                );
                SpeechOutput::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SpeechOutput::Available(_))
    }
}

// ---------------------------------------------------------------------------
// SpeechOutputBridge
// ---------------------------------------------------------------------------

/// Speaks answers in the background, one utterance at a time.
pub struct SpeechOutputBridge {
    capability: SpeechOutput,
    rate: f32,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechOutputBridge {
    pub fn new(capability: SpeechOutput, rate: f32) -> Self {
        Self {
            capability,
            rate,
            current: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// Start speaking `text` in `language`, superseding any utterance still
    /// in progress. Returns immediately.
    pub fn speak(&self, text: &str, language: &str) {
        let synth = match &self.capability {
            SpeechOutput::Available(synth) => Arc::clone(synth),
            SpeechOutput::Unavailable => {
                log::debug!("speech: synthesis unavailable, skipping utterance");
                return;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("speech: no async runtime, skipping utterance");
            return;
        };

        let text = text.to_string();
        let locale_tag = language::locale_tag(language);
        let rate = self.rate;

        let handle = runtime.spawn(async move {
            if let Err(e) = synth.speak(&text, locale_tag, rate).await {
                log::warn!("speech: synthesis in {locale_tag} failed: {e}");
            }
        });

        if let Some(previous) = self.lock_current().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the utterance in progress, if any.
    pub fn cancel(&self) {
        if let Some(current) = self.lock_current().take() {
            current.abort();
        }
    }

    /// Wait for the utterance in progress to finish.
    pub async fn finish(&self) {
        let current = self.lock_current().take();
        if let Some(current) = current {
            let _ = current.await;
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SpeechOutputBridge {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
