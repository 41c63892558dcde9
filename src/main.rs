//! Application entry point — `kisan-chat` terminal assistant.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Build the translator, translation gateway and advisory backend.
//! 5. Check backend health (warning only).
//! 6. Detect speech input/output capabilities.
//! 7. Run the line-oriented chat loop until `/quit` or end of input.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kisan_assistant::{
    app::{ChatApp, ChatCommand, Flow},
    backend::HttpBackend,
    config::{AppConfig, AppPaths},
    conversation::{Orchestrator, OrchestratorSettings},
    language,
    speech::{SpeechInput, SpeechInputBridge, SpeechOutput, SpeechOutputBridge},
    translate::{LibreTranslator, TranslationGateway},
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How often background progress is printed while waiting for input.
const TICK: Duration = Duration::from_millis(150);

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    log::info!("kisan-chat starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e:#}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (turns, translation and speech share one thread)
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config))
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 4. Collaborators
    let gateway = TranslationGateway::from_config(
        Arc::new(LibreTranslator::from_config(&config.translation)),
        &config.translation,
    );
    let backend = HttpBackend::from_config(&config.backend);

    // 5. Health check — the chat still starts when the backend is down.
    match backend.health().await {
        Ok(health) if health.is_ok() => log::info!("backend: {}", health.message),
        Ok(health) => log::warn!("backend reports {}: {}", health.status, health.message),
        Err(e) => log::warn!("backend at {} unreachable: {e}", config.backend.base_url),
    }

    // 6. Speech capabilities
    let paths = AppPaths::new();
    let speech_in = SpeechInputBridge::new(
        SpeechInput::detect(&config.speech, &paths),
        config.speech.capture_timeout(),
    );
    let speech_out = SpeechOutputBridge::new(SpeechOutput::detect(&config.speech), config.speech.rate);

    let initial_language = if language::is_supported(&config.language) {
        config.language.as_str()
    } else {
        log::warn!(
            "configured language `{}` is not supported; using `{}`",
            config.language,
            language::DEFAULT_LANGUAGE
        );
        language::DEFAULT_LANGUAGE
    };

    let orchestrator = Orchestrator::new(
        initial_language,
        OrchestratorSettings::from_config(&config),
        gateway,
        Arc::new(backend),
    )
    .with_speech_input(speech_in)
    .with_speech_output(speech_out);

    // 7. Chat loop
    let mut app = ChatApp::new(Arc::new(orchestrator));
    print_lines(&app.banner());
    print_lines(&app.poll());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            line = input.next_line() => match line {
                Ok(Some(line)) => match app.handle(ChatCommand::parse(&line)) {
                    Flow::Continue(lines) => print_lines(&lines),
                    Flow::Quit => {
                        app.orchestrator().speech_output().cancel();
                        break;
                    }
                },
                // End of input: let the last turn and utterance finish.
                Ok(None) => {
                    print_lines(&app.drain().await);
                    break;
                }
                Err(e) => {
                    log::error!("failed to read input: {e}");
                    break;
                }
            },
            _ = tick.tick() => print_lines(&app.poll()),
        }
    }

    log::info!("kisan-chat exiting");
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
