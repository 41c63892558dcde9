//! Conversation orchestrator — drives one user turn from raw input to an
//! appended answer.
//!
//! # Turn flow
//!
//! ```text
//! submit_turn(text)
//!   └─▶ append user message                              [TranslatingRequest]
//!         └─▶ gateway.translate(text → pivot)            (failure: original text)
//!               └─▶ backend.ask(question)                [QueryingBackend]
//!                     ├─ Err/timeout → append APOLOGY    [Idle]
//!                     └─ Ok(answer)                      [TranslatingResponse]
//!                           └─▶ gateway.translate(answer → user language)
//!                                 └─▶ append answer, speak (background)   [Idle]
//!
//! start_voice_turn()
//!   └─▶ speech_in.start_capture(language) → submit_turn(transcript)
//! ```
//!
//! At most one turn is in flight. A submission while busy is rejected with
//! [`TurnError::Busy`] and leaves the conversation untouched. If a turn's
//! future is dropped part-way, the conversation returns to `Idle`.

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use super::state::{
    new_shared_conversation, Conversation, Message, SharedConversation, TurnContext, TurnState,
    APOLOGY,
};
use crate::backend::AdvisoryBackend;
use crate::config::AppConfig;
use crate::language;
use crate::speech::{
    SpeechError, SpeechInput, SpeechInputBridge, SpeechOutput, SpeechOutputBridge,
};
use crate::translate::TranslationGateway;

// ---------------------------------------------------------------------------
// TurnError / TurnOutcome
// ---------------------------------------------------------------------------

/// Why a turn (or a presentation-layer request) was not started.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Empty or whitespace-only text.
    #[error("nothing to send: the message is empty")]
    InvalidInput,

    /// Another turn is still in flight.
    #[error("please wait, the previous question is still being answered")]
    Busy,

    /// The language code is not in the registry.
    #[error("unsupported language code `{0}`")]
    UnsupportedLanguage(String),

    /// Voice capture could not produce a transcript.
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

/// How a completed turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The answer (possibly untranslated) was appended.
    Answered(String),
    /// The backend was unavailable; the apology was appended.
    Apologized,
}

// ---------------------------------------------------------------------------
// OrchestratorSettings
// ---------------------------------------------------------------------------

/// Explicit configuration handed to the orchestrator at construction.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Language the backend understands.
    pub pivot_language: String,
    /// Speak every appended answer.
    pub speak_responses: bool,
    /// Upper bound on a single backend query.
    pub backend_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            pivot_language: config.pivot_language.clone(),
            speak_responses: config.speech.speak_responses,
            backend_timeout: config.backend.timeout(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// InFlight guard
// ---------------------------------------------------------------------------

/// Returns the conversation to `Idle` if a turn is abandoned mid-way.
struct InFlight<'a> {
    conversation: &'a SharedConversation,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            log::warn!("turn: abandoned before completion, returning to Idle");
            lock(self.conversation).set_turn_state(TurnState::Idle);
        }
    }
}

fn lock(conversation: &SharedConversation) -> MutexGuard<'_, Conversation> {
    conversation.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the conversation and sequences translation, backend and speech.
///
/// Speech capabilities default to `Unavailable`; attach real ones with
/// [`with_speech_input`](Self::with_speech_input) and
/// [`with_speech_output`](Self::with_speech_output).
pub struct Orchestrator {
    conversation: SharedConversation,
    translator: TranslationGateway,
    backend: Arc<dyn AdvisoryBackend>,
    speech_in: SpeechInputBridge,
    speech_out: SpeechOutputBridge,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    /// Create an orchestrator whose conversation starts in `language`.
    pub fn new(
        language: &str,
        settings: OrchestratorSettings,
        translator: TranslationGateway,
        backend: Arc<dyn AdvisoryBackend>,
    ) -> Self {
        if !language::is_supported(language) {
            log::warn!("turn: initial language `{language}` is not supported; speech will use the default locale");
        }

        Self {
            conversation: new_shared_conversation(language),
            translator,
            backend,
            speech_in: SpeechInputBridge::new(SpeechInput::Unavailable, Duration::ZERO),
            speech_out: SpeechOutputBridge::new(SpeechOutput::Unavailable, 1.0),
            settings,
        }
    }

    pub fn with_speech_input(mut self, bridge: SpeechInputBridge) -> Self {
        self.speech_in = bridge;
        self
    }

    pub fn with_speech_output(mut self, bridge: SpeechOutputBridge) -> Self {
        self.speech_out = bridge;
        self
    }

    // -----------------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------------

    /// Shared handle for observers that poll the conversation.
    pub fn conversation(&self) -> SharedConversation {
        Arc::clone(&self.conversation)
    }

    /// Snapshot of the message log.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.conversation).messages().to_vec()
    }

    pub fn language(&self) -> String {
        lock(&self.conversation).language().to_string()
    }

    pub fn turn_state(&self) -> TurnState {
        lock(&self.conversation).turn_state()
    }

    /// `true` while a turn is in flight.
    pub fn is_busy(&self) -> bool {
        self.turn_state().is_busy()
    }

    pub fn voice_available(&self) -> bool {
        self.speech_in.is_available()
    }

    pub fn speech_output(&self) -> &SpeechOutputBridge {
        &self.speech_out
    }

    // -----------------------------------------------------------------------
    // Presentation-layer entry points
    // -----------------------------------------------------------------------

    /// Select the conversation language for subsequent turns.
    pub fn set_language(&self, code: &str) -> Result<(), TurnError> {
        if !language::is_supported(code) {
            return Err(TurnError::UnsupportedLanguage(code.to_string()));
        }
        lock(&self.conversation).set_language(code);
        log::info!("turn: language set to {code}");
        Ok(())
    }

    /// Clear the conversation back to the greeting.
    pub fn reset_conversation(&self) -> Result<(), TurnError> {
        let mut conversation = lock(&self.conversation);
        if conversation.is_busy() {
            return Err(TurnError::Busy);
        }
        conversation.reset();
        log::info!("turn: conversation reset");
        Ok(())
    }

    /// Capture one utterance and submit its transcript as a turn.
    ///
    /// No turn is started (and nothing is appended) when capture fails,
    /// including when the host has no capture capability.
    pub async fn start_voice_turn(&self) -> Result<TurnOutcome, TurnError> {
        let language = {
            let conversation = lock(&self.conversation);
            if conversation.is_busy() {
                return Err(TurnError::Busy);
            }
            conversation.language().to_string()
        };

        let transcript = self.speech_in.start_capture(&language).await?;
        log::debug!("turn: voice transcript {transcript:?}");
        self.submit_turn(&transcript).await
    }

    /// Stop a pending voice capture. Returns `true` when one was pending.
    pub fn stop_voice_capture(&self) -> bool {
        self.speech_in.stop_capture()
    }

    /// Run one full turn for `text` in the selected language.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnOutcome, TurnError> {
        let input = text.trim();
        if input.is_empty() {
            return Err(TurnError::InvalidInput);
        }

        let mut turn = self.begin_turn(input)?;
        let mut guard = InFlight {
            conversation: &self.conversation,
            finished: false,
        };
        let pivot = self.settings.pivot_language.as_str();

        // ── 1. Question → pivot language ────────────────────────────────
        let question = self
            .translator
            .translate(&turn.input, &turn.language, pivot)
            .await;
        let question = turn.pivot_question.insert(question);

        // ── 2. Backend query ─────────────────────────────────────────────
        self.transition(TurnState::QueryingBackend);

        let asked = tokio::time::timeout(self.settings.backend_timeout, self.backend.ask(question)).await;
        let answer = match asked {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                log::warn!("turn: backend unavailable, apologising: {e}");
                self.finish_turn(Message::assistant(APOLOGY));
                guard.finished = true;
                return Ok(TurnOutcome::Apologized);
            }
            Err(_) => {
                log::warn!(
                    "turn: backend did not answer within {:?}, apologising",
                    self.settings.backend_timeout
                );
                self.finish_turn(Message::assistant(APOLOGY));
                guard.finished = true;
                return Ok(TurnOutcome::Apologized);
            }
        };
        let answer = turn.pivot_answer.insert(answer);

        // ── 3. Answer → user language ────────────────────────────────────
        self.transition(TurnState::TranslatingResponse);

        let reply = self
            .translator
            .translate(answer, pivot, &turn.language)
            .await;

        self.finish_turn(Message::assistant(reply.clone()));
        guard.finished = true;

        // ── 4. Speak (fire-and-forget) ───────────────────────────────────
        if self.settings.speak_responses {
            self.speech_out.speak(&reply, &turn.language);
        }

        Ok(TurnOutcome::Answered(reply))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Atomically check `Idle`, append the user message and leave `Idle`.
    fn begin_turn(&self, input: &str) -> Result<TurnContext, TurnError> {
        let mut conversation = lock(&self.conversation);
        if conversation.is_busy() {
            log::debug!("turn: rejected, {} in progress", conversation.turn_state().label());
            return Err(TurnError::Busy);
        }

        conversation.push(Message::user(input));
        conversation.set_turn_state(TurnState::TranslatingRequest);
        log::debug!("turn: Idle → TranslatingRequest ({})", conversation.language());

        Ok(TurnContext::new(input, conversation.language()))
    }

    fn transition(&self, state: TurnState) {
        let mut conversation = lock(&self.conversation);
        log::debug!("turn: {:?} → {state:?}", conversation.turn_state());
        conversation.set_turn_state(state);
    }

    fn finish_turn(&self, message: Message) {
        let mut conversation = lock(&self.conversation);
        conversation.push(message);
        conversation.set_turn_state(TurnState::Idle);
        log::debug!("turn: → Idle ({} messages)", conversation.messages().len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
