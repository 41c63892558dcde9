//! `CommandSynthesizer` — speech synthesis through an espeak-compatible
//! program (`espeak-ng`, `espeak`).
//!
//! The text is written to the program's stdin, so answers that begin with
//! `-` are never mistaken for flags. The child is spawned with
//! `kill_on_drop`, so aborting the utterance task silences it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{SpeechError, SpeechSynthesizer};
use crate::language::primary_subtag;

/// Bounds accepted by espeak's `-s` option.
const MIN_WPM: u32 = 80;
const MAX_WPM: u32 = 450;

/// Speaks through an external espeak-compatible program.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: PathBuf,
    words_per_minute: u32,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<PathBuf>, words_per_minute: u32) -> Self {
        Self {
            program: program.into(),
            words_per_minute,
        }
    }

    /// Resolve `program` on `PATH`; `None` when it is not installed.
    pub fn detect(program: &str, words_per_minute: u32) -> Option<Self> {
        which::which(program)
            .ok()
            .map(|path| Self::new(path, words_per_minute))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command-line arguments for one utterance.
    fn args(&self, locale_tag: &str, rate: f32) -> Vec<String> {
        let wpm = (self.words_per_minute as f32 * rate).round().max(0.0) as u32;
        vec![
            "-v".into(),
            primary_subtag(locale_tag).to_string(),
            "-s".into(),
            wpm.clamp(MIN_WPM, MAX_WPM).to_string(),
            "--stdin".into(),
        ]
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str, locale_tag: &str, rate: f32) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.program)
            .args(self.args(locale_tag, rate))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Synthesis(format!("{}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(text.as_bytes()).await {
                Ok(()) => {}
                // The program exited without reading; its status tells the story.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(SpeechError::Synthesis(e.to_string())),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| SpeechError::Synthesis(e.to_string()))?;

        if !status.success() {
            return Err(SpeechError::Synthesis(format!(
                "{} exited with {status}",
                self.program.display()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
