//! Conversation data model and turn state machine.
//!
//! [`Conversation`] is the single source of truth the presentation layer
//! reads: the append-only message log, the selected language, and the
//! current [`TurnState`]. It is held behind [`SharedConversation`]
//! (`Arc<Mutex<Conversation>>`); only the orchestrator mutates it.

use std::sync::{Arc, Mutex};

/// Seeded assistant greeting; always the first message.
pub const GREETING: &str =
    "👋 Namaste! मैं आपका किसान मित्र हूँ। You can ask me in Hindi, Kannada, Tamil, English and more!";

/// Appended instead of an answer when the backend is unavailable.
pub const APOLOGY: &str = "⚠️ Server error. Try again.";

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// Where the conversation is within a user turn.
///
/// ```text
/// Idle ──submit──▶ TranslatingRequest ──▶ QueryingBackend ──answer──▶ TranslatingResponse ──▶ Idle
///                                                      └──failure──▶ Idle (apology appended)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn in flight.
    #[default]
    Idle,
    /// Translating the question into the pivot language.
    TranslatingRequest,
    /// Waiting on the advisory backend.
    QueryingBackend,
    /// Translating the answer back into the farmer's language.
    TranslatingResponse,
}

impl TurnState {
    /// `true` while a turn is in flight.
    ///
    /// ```
    /// use kisan_assistant::conversation::TurnState;
    ///
    /// assert!(!TurnState::Idle.is_busy());
    /// assert!(TurnState::QueryingBackend.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, TurnState::Idle)
    }

    /// Short status label for the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::Idle => "Idle",
            TurnState::TranslatingRequest => "Translating question",
            TurnState::QueryingBackend => "Thinking",
            TurnState::TranslatingResponse => "Translating answer",
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Append-only message log plus the selected language and turn state.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    language: String,
    turn_state: TurnState,
}

impl Conversation {
    /// A fresh conversation seeded with the greeting.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
            language: language.into(),
            turn_state: TurnState::Idle,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn is_busy(&self) -> bool {
        self.turn_state.is_busy()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_turn_state(&mut self, state: TurnState) {
        self.turn_state = state;
    }

    pub(crate) fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    /// Drop every message except a fresh greeting. Language is kept.
    pub(crate) fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(GREETING));
        self.turn_state = TurnState::Idle;
    }
}

// ---------------------------------------------------------------------------
// SharedConversation
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`Conversation`].
///
/// Lock for a short critical section; never hold the lock across `.await`.
pub type SharedConversation = Arc<Mutex<Conversation>>;

pub fn new_shared_conversation(language: impl Into<String>) -> SharedConversation {
    Arc::new(Mutex::new(Conversation::new(language)))
}

// ---------------------------------------------------------------------------
// TurnContext
// ---------------------------------------------------------------------------

/// Scratch state of one in-flight turn; dropped when the turn ends.
#[derive(Debug, Clone)]
pub(crate) struct TurnContext {
    /// Trimmed text as the farmer entered it.
    pub input: String,
    /// Language selected when the turn started.
    pub language: String,
    /// `input` in the pivot language (or `input` itself when degraded).
    pub pivot_question: Option<String>,
    /// Backend answer in the pivot language.
    pub pivot_answer: Option<String>,
}

impl TurnContext {
    pub fn new(input: &str, language: &str) -> Self {
        Self {
            input: input.to_string(),
            language: language.to_string(),
            pivot_question: None,
            pivot_answer: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_conversation_starts_with_greeting() {
        let conv = Conversation::new("hi");
        assert_eq!(conv.messages(), [Message::assistant(GREETING)]);
        assert_eq!(conv.language(), "hi");
        assert_eq!(conv.turn_state(), TurnState::Idle);
        assert!(!conv.is_busy());
    }

    #[test]
    fn only_idle_is_not_busy() {
        assert!(!TurnState::Idle.is_busy());
        assert!(TurnState::TranslatingRequest.is_busy());
        assert!(TurnState::QueryingBackend.is_busy());
        assert!(TurnState::TranslatingResponse.is_busy());
        assert_eq!(TurnState::default(), TurnState::Idle);
    }

    #[test]
    fn reset_keeps_language_and_reseeds_greeting() {
        let mut conv = Conversation::new("ta");
        conv.push(Message::user("மழை"));
        conv.push(Message::assistant("rain"));
        conv.set_turn_state(TurnState::QueryingBackend);

        conv.reset();

        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].text(), GREETING);
        assert_eq!(conv.messages()[0].role(), Role::Assistant);
        assert_eq!(conv.language(), "ta");
        assert_eq!(conv.turn_state(), TurnState::Idle);
    }

    #[test]
    fn shared_conversation_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedConversation>();
    }

    #[test]
    fn labels_are_distinct() {
        let labels = [
            TurnState::Idle.label(),
            TurnState::TranslatingRequest.label(),
            TurnState::QueryingBackend.label(),
            TurnState::TranslatingResponse.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
