//! Speech capture and synthesis bridges.
//!
//! Both host capabilities are modelled as a polymorphic capability resolved
//! once at startup — `Available(impl)` or `Unavailable` — so the conversation
//! orchestrator never probes the environment itself.
//!
//! ```text
//!  SpeechInput  ─┬─ Available(Arc<dyn SpeechRecognizer>)   WhisperRecognizer (feature "local-speech")
//!                └─ Unavailable
//!
//!  SpeechOutput ─┬─ Available(Arc<dyn SpeechSynthesizer>)  CommandSynthesizer (espeak-ng on PATH)
//!                └─ Unavailable
//! ```
//!
//! [`SpeechInputBridge`] runs one single-shot capture at a time; a new
//! capture supersedes a pending one. [`SpeechOutputBridge`] speaks in the
//! background; a new utterance supersedes the one in progress.

pub mod espeak;
pub mod input;
pub mod output;
#[cfg(feature = "local-speech")]
pub mod whisper;

use thiserror::Error;

pub use espeak::CommandSynthesizer;
pub use input::{SpeechInput, SpeechInputBridge, SpeechRecognizer};
pub use output::{SpeechOutput, SpeechOutputBridge, SpeechSynthesizer};
#[cfg(feature = "local-speech")]
pub use whisper::WhisperRecognizer;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors raised by speech capture and synthesis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The host has no usable capture / synthesis capability.
    #[error("speech capability is not available on this host")]
    Unavailable,

    /// Capture finished but nothing intelligible was said.
    #[error("no speech was captured")]
    NoSpeech,

    /// The capture device or recognizer failed.
    #[error("speech capture failed: {0}")]
    Capture(String),

    /// Capture did not produce a transcript within the configured bound.
    #[error("speech capture timed out")]
    Timeout,

    /// A newer capture request replaced this one.
    #[error("speech capture superseded by a newer request")]
    Superseded,

    /// The capture was stopped explicitly.
    #[error("speech capture stopped")]
    Stopped,

    /// The synthesizer failed to speak.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}
