//! Speech input bridge — single-shot voice capture.
//!
//! [`SpeechInputBridge::start_capture`] resolves the language code to a
//! locale tag, asks the recognizer for exactly one transcript, and bounds the
//! wait with a timeout. Only one capture is pending at a time: starting a new
//! one resolves the previous with [`SpeechError::Superseded`], and
//! [`SpeechInputBridge::stop_capture`] resolves it with
//! [`SpeechError::Stopped`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::SpeechError;
use crate::config::{AppPaths, SpeechConfig};
use crate::language;

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// A speech-capture capability that yields one transcript per call.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen once in `locale_tag` (e.g. `"hi-IN"`) and return the transcript.
    async fn listen(&self, locale_tag: &str) -> Result<String, SpeechError>;
}

// ---------------------------------------------------------------------------
// SpeechInput
// ---------------------------------------------------------------------------

/// Speech-capture capability, resolved once at startup.
#[derive(Clone)]
pub enum SpeechInput {
    Available(Arc<dyn SpeechRecognizer>),
    Unavailable,
}

impl SpeechInput {
    /// Probe the host for a usable recognizer.
    ///
    /// With the `local-speech` feature this loads the configured Whisper
    /// model and checks for a default input device; otherwise capture is
    /// always unavailable.
    pub fn detect(config: &SpeechConfig, paths: &AppPaths) -> Self {
        #[cfg(feature = "local-speech")]
        {
            let model = paths.whisper_model(&config.whisper_model);
            match super::whisper::WhisperRecognizer::load(&model, config.capture_secs) {
                Ok(recognizer) => {
                    log::info!("speech: voice capture ready ({})", model.display());
                    SpeechInput::Available(Arc::new(recognizer))
                }
                Err(e) => {
                    log::warn!("speech: voice capture unavailable ({}): {e}", model.display());
                    SpeechInput::Unavailable
                }
            }
        }

        #[cfg(not(feature = "local-speech"))]
        {
            let _ = (config, paths);
            log::info!("speech: built without `local-speech`; voice capture unavailable");
            SpeechInput::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SpeechInput::Available(_))
    }
}

// ---------------------------------------------------------------------------
// SpeechInputBridge
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum CaptureEnd {
    Superseded,
    Stopped,
}

/// The capture currently awaiting a transcript.
struct PendingCapture {
    id: u64,
    cancel: oneshot::Sender<CaptureEnd>,
}

/// Runs single-shot captures against a [`SpeechInput`] capability.
pub struct SpeechInputBridge {
    capability: SpeechInput,
    timeout: Duration,
    next_id: AtomicU64,
    pending: Mutex<Option<PendingCapture>>,
}

impl SpeechInputBridge {
    pub fn new(capability: SpeechInput, timeout: Duration) -> Self {
        Self {
            capability,
            timeout,
            next_id: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// Capture one utterance in `language` and return its trimmed transcript.
    ///
    /// # Errors
    ///
    /// * [`SpeechError::Unavailable`] immediately when the host cannot capture.
    /// * [`SpeechError::Superseded`] / [`SpeechError::Stopped`] when a newer
    ///   capture or [`stop_capture`](Self::stop_capture) ends this one.
    /// * [`SpeechError::Timeout`] when no transcript arrives in time.
    /// * [`SpeechError::NoSpeech`] when the transcript is blank.
    pub async fn start_capture(&self, language: &str) -> Result<String, SpeechError> {
        let recognizer = match &self.capability {
            SpeechInput::Available(recognizer) => Arc::clone(recognizer),
            SpeechInput::Unavailable => return Err(SpeechError::Unavailable),
        };

        let locale_tag = language::locale_tag(language);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let previous = self.lock_pending().replace(PendingCapture {
            id,
            cancel: cancel_tx,
        });
        if let Some(previous) = previous {
            log::debug!("speech: capture #{} superseded by #{id}", previous.id);
            let _ = previous.cancel.send(CaptureEnd::Superseded);
        }

        log::debug!("speech: capture #{id} listening in {locale_tag}");

        let outcome = tokio::select! {
            heard = tokio::time::timeout(self.timeout, recognizer.listen(locale_tag)) => {
                heard.unwrap_or(Err(SpeechError::Timeout))
            }
            end = cancel_rx => match end {
                Ok(CaptureEnd::Superseded) => Err(SpeechError::Superseded),
                Ok(CaptureEnd::Stopped) | Err(_) => Err(SpeechError::Stopped),
            },
        };

        {
            let mut pending = self.lock_pending();
            if pending.as_ref().is_some_and(|p| p.id == id) {
                *pending = None;
            }
        }

        let transcript = outcome?.trim().to_string();
        if transcript.is_empty() {
            return Err(SpeechError::NoSpeech);
        }
        Ok(transcript)
    }

    /// Stop the pending capture, if any. Returns `true` when one was pending.
    pub fn stop_capture(&self) -> bool {
        match self.lock_pending().take() {
            Some(pending) => {
                log::debug!("speech: capture #{} stopped", pending.id);
                let _ = pending.cancel.send(CaptureEnd::Stopped);
                true
            }
            None => false,
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingCapture>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Notify;

    /// Returns a fixed transcript and remembers the requested locale.
    struct Scripted {
        transcript: String,
        heard_locale: Mutex<Option<String>>,
    }

    #[async_trait]
    impl SpeechRecognizer for Scripted {
        async fn listen(&self, locale_tag: &str) -> Result<String, SpeechError> {
            *self.heard_locale.lock().unwrap() = Some(locale_tag.to_string());
            Ok(self.transcript.clone())
        }
    }

    /// Blocks until notified, then returns a transcript.
    struct Gated {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SpeechRecognizer for Gated {
        async fn listen(&self, _locale_tag: &str) -> Result<String, SpeechError> {
            self.gate.notified().await;
            Ok("late".into())
        }
    }

    fn scripted(transcript: &str) -> Arc<Scripted> {
        Arc::new(Scripted {
            transcript: transcript.into(),
            heard_locale: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn unavailable_fails_fast() {
        let bridge = SpeechInputBridge::new(SpeechInput::Unavailable, Duration::from_secs(1));
        assert!(!bridge.is_available());
        assert_eq!(bridge.start_capture("hi").await, Err(SpeechError::Unavailable));
    }

    #[tokio::test]
    async fn transcript_is_trimmed_and_locale_resolved() {
        let recognizer = scripted("  गेहूं को पानी  ");
        let bridge = SpeechInputBridge::new(
            SpeechInput::Available(recognizer.clone()),
            Duration::from_secs(1),
        );

        assert_eq!(bridge.start_capture("hi").await.unwrap(), "गेहूं को पानी");
        assert_eq!(recognizer.heard_locale.lock().unwrap().as_deref(), Some("hi-IN"));
    }

    #[tokio::test]
    async fn unknown_language_uses_default_locale() {
        let recognizer = scripted("hello");
        let bridge = SpeechInputBridge::new(
            SpeechInput::Available(recognizer.clone()),
            Duration::from_secs(1),
        );

        bridge.start_capture("fr").await.unwrap();
        assert_eq!(recognizer.heard_locale.lock().unwrap().as_deref(), Some("en-IN"));
    }

    #[tokio::test]
    async fn blank_transcript_is_no_speech() {
        let bridge = SpeechInputBridge::new(
            SpeechInput::Available(scripted("   ")),
            Duration::from_secs(1),
        );
        assert_eq!(bridge.start_capture("en").await, Err(SpeechError::NoSpeech));
    }

    #[tokio::test]
    async fn capture_times_out() {
        let bridge = SpeechInputBridge::new(
            SpeechInput::Available(Arc::new(Gated {
                gate: Arc::new(Notify::new()),
            })),
            Duration::from_millis(50),
        );
        assert_eq!(bridge.start_capture("en").await, Err(SpeechError::Timeout));
    }

    #[tokio::test]
    async fn new_capture_supersedes_pending_one() {
        let gate = Arc::new(Notify::new());
        let bridge = Arc::new(SpeechInputBridge::new(
            SpeechInput::Available(Arc::new(Gated { gate: gate.clone() })),
            Duration::from_secs(5),
        ));

        let first = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.start_capture("en").await }
        });
        // Let the first capture register itself.
        while bridge.lock_pending().is_none() {
            tokio::task::yield_now().await;
        }

        let second = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.start_capture("en").await }
        });

        assert_eq!(first.await.unwrap(), Err(SpeechError::Superseded));

        gate.notify_one();
        assert_eq!(second.await.unwrap().unwrap(), "late");
        assert!(bridge.lock_pending().is_none());
    }

    #[tokio::test]
    async fn stop_capture_ends_pending_capture() {
        let bridge = Arc::new(SpeechInputBridge::new(
            SpeechInput::Available(Arc::new(Gated {
                gate: Arc::new(Notify::new()),
            })),
            Duration::from_secs(5),
        ));
        assert!(!bridge.stop_capture());

        let capture = tokio::spawn({
            let bridge = Arc::clone(&bridge);
            async move { bridge.start_capture("ta").await }
        });
        while bridge.lock_pending().is_none() {
            tokio::task::yield_now().await;
        }

        assert!(bridge.stop_capture());
        assert_eq!(capture.await.unwrap(), Err(SpeechError::Stopped));
    }
}
