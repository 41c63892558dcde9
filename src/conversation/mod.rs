//! Conversation core: message log, turn state machine and the orchestrator
//! that drives a turn.
//!
//! # Architecture
//!
//! ```text
//! ChatApp (terminal)  ──submit_turn / start_voice_turn──▶  Orchestrator
//!                                                             │
//!                           ┌─────────────────────────────────┼───────────────┐
//!                           ▼                                 ▼               ▼
//!                  TranslationGateway               AdvisoryBackend   SpeechOutputBridge
//!
//! SharedConversation (Arc<Mutex<Conversation>>) ◀── read by ChatApp after each command
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kisan_assistant::backend::HttpBackend;
//! use kisan_assistant::config::AppConfig;
//! use kisan_assistant::conversation::{Orchestrator, OrchestratorSettings};
//! use kisan_assistant::translate::{LibreTranslator, TranslationGateway};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let gateway = TranslationGateway::from_config(
//!         Arc::new(LibreTranslator::from_config(&config.translation)),
//!         &config.translation,
//!     );
//!     let orchestrator = Orchestrator::new(
//!         "hi",
//!         OrchestratorSettings::from_config(&config),
//!         gateway,
//!         Arc::new(HttpBackend::from_config(&config.backend)),
//!     );
//!
//!     let _ = orchestrator.submit_turn("गेहूं में कौन सी खाद डालें?").await;
//!     for message in orchestrator.messages() {
//!         println!("{:?}: {}", message.role(), message.text());
//!     }
//! }
//! ```

pub mod orchestrator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use orchestrator::{Orchestrator, OrchestratorSettings, TurnError, TurnOutcome};
pub use state::{
    new_shared_conversation, Conversation, Message, Role, SharedConversation, TurnState, APOLOGY,
    GREETING,
};
