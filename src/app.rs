//! Terminal chat front-end.
//!
//! # Architecture
//!
//! [`ChatApp`] owns the [`Orchestrator`] and translates input lines into
//! orchestrator calls. Turns run on background tasks so the farmer can
//! still type `/stop` (or be told to wait) while an answer is on its way.
//! [`ChatApp::poll`] is called on every tick and returns the lines to print:
//! new messages, status changes and notices from finished turns.
//!
//! # Commands
//!
//! | Input | Action |
//! |-------|--------|
//! | any text | ask a question in the selected language |
//! | `/voice` | capture one spoken question |
//! | `/stop` | stop a pending voice capture |
//! | `/lang <code>` | switch language (`hi`, `kn`, `ta`, …) |
//! | `/languages` | list supported languages |
//! | `/reset` | clear the conversation |
//! | `/help` | show this table |
//! | `/quit` | exit |

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::conversation::{Message, Orchestrator, Role, TurnError, TurnOutcome, TurnState};
use crate::language::{self, LANGUAGES};
use crate::speech::SpeechError;

const HELP: &[&str] = &[
    "Type a question and press Enter.",
    "  /voice           ask by voice",
    "  /stop            stop listening",
    "  /lang <code>     switch language",
    "  /languages       list languages",
    "  /reset           start a new conversation",
    "  /quit            exit",
];

// ---------------------------------------------------------------------------
// ChatCommand
// ---------------------------------------------------------------------------

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Free text to submit as a turn.
    Say(String),
    Voice,
    Stop,
    /// `/lang <code>`; `None` when the code is missing.
    Language(Option<String>),
    Languages,
    Reset,
    Help,
    Quit,
    /// Blank line.
    Nothing,
    /// A `/command` we do not know.
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Nothing;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ChatCommand::Say(line.to_string());
        };

        let mut words = command.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        match name.as_str() {
            "voice" | "mic" => ChatCommand::Voice,
            "stop" => ChatCommand::Stop,
            "lang" | "language" => ChatCommand::Language(words.next().map(str::to_ascii_lowercase)),
            "languages" | "langs" => ChatCommand::Languages,
            "reset" | "new" => ChatCommand::Reset,
            "help" | "?" => ChatCommand::Help,
            "quit" | "exit" | "q" => ChatCommand::Quit,
            _ => ChatCommand::Unknown(line.to_string()),
        }
    }
}

/// What the REPL should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    /// Print these lines and keep reading.
    Continue(Vec<String>),
    Quit,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// One printed line for a message.
pub fn render_message(message: &Message) -> String {
    match message.role() {
        Role::User => format!("you  › {}", message.text()),
        Role::Assistant => format!("🌾   › {}", message.text()),
    }
}

fn render_state(state: TurnState) -> Option<String> {
    state.is_busy().then(|| format!("… {}", state.label()))
}

fn render_error(error: &TurnError) -> String {
    match error {
        TurnError::Speech(SpeechError::Unavailable) => {
            "Voice input is not available on this machine.".to_string()
        }
        TurnError::Speech(SpeechError::Superseded | SpeechError::Stopped) => {
            "Stopped listening.".to_string()
        }
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ChatApp
// ---------------------------------------------------------------------------

/// Terminal presentation layer over one [`Orchestrator`].
pub struct ChatApp {
    orchestrator: Arc<Orchestrator>,
    /// Number of messages already printed.
    shown: usize,
    /// State printed last, so status lines are only shown on change.
    last_state: TurnState,
    /// Turn tasks that may still be running.
    turns: Vec<JoinHandle<()>>,
    notices_tx: mpsc::UnboundedSender<String>,
    notices_rx: mpsc::UnboundedReceiver<String>,
}

impl ChatApp {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        Self {
            orchestrator,
            shown: 0,
            last_state: TurnState::Idle,
            turns: Vec::new(),
            notices_tx,
            notices_rx,
        }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Lines printed once at startup, before the greeting.
    pub fn banner(&self) -> Vec<String> {
        let language = self.orchestrator.language();
        let label = language::lookup(&language).map_or(language.as_str(), |entry| entry.label);
        let mut lines = vec![format!("Kisan Mitra — language: {label} (/help for commands)")];
        if !self.orchestrator.voice_available() {
            lines.push("(voice input unavailable)".to_string());
        }
        lines
    }

    /// Act on one command. Turns are started in the background; their
    /// results show up through [`poll`](Self::poll).
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&mut self, command: ChatCommand) -> Flow {
        let lines = match command {
            ChatCommand::Nothing => Vec::new(),
            ChatCommand::Quit => return Flow::Quit,
            ChatCommand::Help => HELP.iter().map(|line| line.to_string()).collect(),
            ChatCommand::Unknown(line) => vec![format!("Unknown command `{line}`; try /help")],

            ChatCommand::Say(text) => {
                if self.orchestrator.is_busy() {
                    vec![render_error(&TurnError::Busy)]
                } else {
                    let orchestrator = Arc::clone(&self.orchestrator);
                    self.spawn_turn(async move { orchestrator.submit_turn(&text).await });
                    Vec::new()
                }
            }

            ChatCommand::Voice => {
                if !self.orchestrator.voice_available() {
                    vec![render_error(&TurnError::Speech(SpeechError::Unavailable))]
                } else if self.orchestrator.is_busy() {
                    vec![render_error(&TurnError::Busy)]
                } else {
                    let orchestrator = Arc::clone(&self.orchestrator);
                    self.spawn_turn(async move { orchestrator.start_voice_turn().await });
                    vec!["🎤 Listening…".to_string()]
                }
            }

            ChatCommand::Stop => {
                if self.orchestrator.stop_voice_capture() {
                    Vec::new()
                } else {
                    vec!["Not listening.".to_string()]
                }
            }

            ChatCommand::Language(None) => vec!["Usage: /lang <code>  (see /languages)".to_string()],
            ChatCommand::Language(Some(code)) => match self.orchestrator.set_language(&code) {
                Ok(()) => {
                    let label = language::lookup(&code).map_or(code.as_str(), |entry| entry.label);
                    vec![format!("Language: {label}")]
                }
                Err(e) => vec![format!("{}; see /languages", render_error(&e))],
            },

            ChatCommand::Languages => {
                let current = self.orchestrator.language();
                LANGUAGES
                    .iter()
                    .map(|entry| {
                        let marker = if entry.code == current { '*' } else { ' ' };
                        format!("{marker} {:<3} {}", entry.code, entry.label)
                    })
                    .collect()
            }

            ChatCommand::Reset => match self.orchestrator.reset_conversation() {
                Ok(()) => {
                    self.orchestrator.speech_output().cancel();
                    self.shown = 0;
                    vec!["— new conversation —".to_string()]
                }
                Err(e) => vec![render_error(&e)],
            },
        };
        Flow::Continue(lines)
    }

    /// Collect everything that changed since the last call.
    pub fn poll(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        let (state, fresh) = {
            let conversation = self.orchestrator.conversation();
            let conversation = conversation
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let messages = conversation.messages();
            // A reset from elsewhere shrinks the log.
            if self.shown > messages.len() {
                self.shown = 0;
            }
            let fresh: Vec<String> = messages[self.shown..].iter().map(render_message).collect();
            self.shown = messages.len();
            (conversation.turn_state(), fresh)
        };

        if state != self.last_state {
            lines.extend(render_state(state));
            self.last_state = state;
        }
        lines.extend(fresh);

        while let Ok(notice) = self.notices_rx.try_recv() {
            lines.push(notice);
        }
        lines
    }

    /// Wait for the turn in flight and the current utterance to finish.
    pub async fn drain(&mut self) -> Vec<String> {
        for turn in std::mem::take(&mut self.turns) {
            if let Err(e) = turn.await {
                log::warn!("app: turn task failed: {e}");
            }
        }
        let lines = self.poll();
        self.orchestrator.speech_output().finish().await;
        lines
    }

    fn spawn_turn<F>(&mut self, turn: F)
    where
        F: std::future::Future<Output = Result<TurnOutcome, TurnError>> + Send + 'static,
    {
        let notices = self.notices_tx.clone();
        self.turns.retain(|turn| !turn.is_finished());
        self.turns.push(tokio::spawn(async move {
            match turn.await {
                Ok(TurnOutcome::Answered(_)) => {}
                Ok(TurnOutcome::Apologized) => {
                    log::debug!("app: turn ended with an apology");
                }
                Err(e) => {
                    let _ = notices.send(render_error(&e));
                }
            }
        }));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AdvisoryBackend, BackendError};
    use crate::conversation::{OrchestratorSettings, GREETING};
    use crate::speech::{SpeechInput, SpeechInputBridge, SpeechRecognizer};
    use crate::translate::{TranslateError, TranslationGateway, Translator};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Translator for Echo {
        async fn translate(&self, text: &str, _s: &str, target: &str) -> Result<String, TranslateError> {
            Ok(format!("[{target}] {text}"))
        }
    }

    struct Agronomist;

    #[async_trait]
    impl AdvisoryBackend for Agronomist {
        async fn ask(&self, _question: &str) -> Result<String, BackendError> {
            Ok("Irrigate every 10 days.".into())
        }
    }

    /// Listens until stopped.
    struct Patient;

    #[async_trait]
    impl SpeechRecognizer for Patient {
        async fn listen(&self, _locale_tag: &str) -> Result<String, SpeechError> {
            std::future::pending().await
        }
    }

    fn app(language: &str) -> ChatApp {
        let orchestrator = Orchestrator::new(
            language,
            OrchestratorSettings {
                pivot_language: "en".into(),
                speak_responses: false,
                backend_timeout: Duration::from_secs(1),
            },
            TranslationGateway::new(Arc::new(Echo), Duration::from_secs(1), false),
            Arc::new(Agronomist),
        );
        ChatApp::new(Arc::new(orchestrator))
    }

    fn lines(flow: Flow) -> Vec<String> {
        match flow {
            Flow::Continue(lines) => lines,
            Flow::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parses_text_and_commands() {
        assert_eq!(ChatCommand::parse("  "), ChatCommand::Nothing);
        assert_eq!(
            ChatCommand::parse(" धान कब बोएं? "),
            ChatCommand::Say("धान कब बोएं?".into())
        );
        assert_eq!(ChatCommand::parse("/voice"), ChatCommand::Voice);
        assert_eq!(ChatCommand::parse("/STOP"), ChatCommand::Stop);
        assert_eq!(ChatCommand::parse("/lang KN"), ChatCommand::Language(Some("kn".into())));
        assert_eq!(ChatCommand::parse("/lang"), ChatCommand::Language(None));
        assert_eq!(ChatCommand::parse("/languages"), ChatCommand::Languages);
        assert_eq!(ChatCommand::parse("/reset"), ChatCommand::Reset);
        assert_eq!(ChatCommand::parse("/help"), ChatCommand::Help);
        assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/weather"), ChatCommand::Unknown("/weather".into()));
    }

    #[test]
    fn renders_roles_distinctly() {
        assert_eq!(render_message(&Message::user("hello")), "you  › hello");
        assert!(render_message(&Message::assistant("hi")).ends_with("› hi"));
        assert_eq!(render_state(TurnState::Idle), None);
        assert_eq!(render_state(TurnState::QueryingBackend), Some("… Thinking".into()));
    }

    #[tokio::test]
    async fn first_poll_shows_greeting_then_nothing() {
        let mut app = app("en");
        assert_eq!(app.poll(), [render_message(&Message::assistant(GREETING))]);
        assert!(app.poll().is_empty());
    }

    #[tokio::test]
    async fn question_is_answered_in_selected_language() {
        let mut app = app("hi");
        app.poll();

        assert!(lines(app.handle(ChatCommand::parse("पानी कब दें?"))).is_empty());
        let printed = app.drain().await;

        assert!(printed.contains(&"you  › पानी कब दें?".to_string()));
        assert!(printed.contains(&render_message(&Message::assistant("[hi] Irrigate every 10 days."))));
        assert!(!app.orchestrator().is_busy());
    }

    #[tokio::test]
    async fn language_commands() {
        let mut app = app("en");

        assert_eq!(lines(app.handle(ChatCommand::parse("/lang ta"))), ["Language: தமிழ் (Tamil)"]);
        assert_eq!(app.orchestrator().language(), "ta");

        let rejected = lines(app.handle(ChatCommand::parse("/lang fr")));
        assert!(rejected[0].contains("`fr`"));
        assert_eq!(app.orchestrator().language(), "ta");

        let listed = lines(app.handle(ChatCommand::Languages));
        assert_eq!(listed.len(), LANGUAGES.len());
        assert!(listed.iter().any(|line| line.starts_with("* ta")));
    }

    #[tokio::test]
    async fn reset_reprints_greeting() {
        let mut app = app("en");
        app.handle(ChatCommand::Say("hello".into()));
        app.drain().await;

        lines(app.handle(ChatCommand::Reset));

        assert_eq!(app.poll(), [render_message(&Message::assistant(GREETING))]);
    }

    #[tokio::test]
    async fn voice_without_capability_explains() {
        let mut app = app("en");
        let printed = lines(app.handle(ChatCommand::Voice));
        assert_eq!(printed, ["Voice input is not available on this machine."]);
        assert_eq!(lines(app.handle(ChatCommand::Stop)), ["Not listening."]);
    }

    #[tokio::test]
    async fn stop_ends_pending_voice_capture() {
        let orchestrator = Orchestrator::new(
            "en",
            OrchestratorSettings::default(),
            TranslationGateway::new(Arc::new(Echo), Duration::from_secs(1), false),
            Arc::new(Agronomist),
        )
        .with_speech_input(SpeechInputBridge::new(
            SpeechInput::Available(Arc::new(Patient)),
            Duration::from_secs(30),
        ));
        let mut app = ChatApp::new(Arc::new(orchestrator));
        app.poll();

        assert_eq!(lines(app.handle(ChatCommand::Voice)), ["🎤 Listening…"]);
        // Let the capture register before stopping it.
        let mut stopped = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if app.orchestrator().stop_voice_capture() {
                stopped = true;
                break;
            }
        }
        assert!(stopped);

        let mut printed = Vec::new();
        for _ in 0..100 {
            tokio::task::yield_now().await;
            printed.extend(app.poll());
            if !printed.is_empty() {
                break;
            }
        }
        assert_eq!(printed, ["Stopped listening."]);
        assert_eq!(app.orchestrator().messages().len(), 1);
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut app = app("en");
        assert_eq!(app.handle(ChatCommand::Quit), Flow::Quit);
    }
}
