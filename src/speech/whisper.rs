//! Local speech capture: `cpal` microphone → 16 kHz mono → `whisper-rs`.
//!
//! Compiled only with the `local-speech` feature. One [`listen`] call records
//! a fixed window from the default input device and transcribes it in the
//! language named by the locale tag's primary subtag.
//!
//! Recording and inference are blocking and run on the blocking thread pool.
//! Dropping the `listen` future (timeout, supersede, stop) abandons the
//! result; the blocking job still runs out its recording window.
//!
//! [`listen`]: SpeechRecognizer::listen

use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{SpeechError, SpeechRecognizer};
use crate::language::primary_subtag;

/// Sample rate Whisper expects.
const WHISPER_RATE: u32 = 16_000;
/// 0.5 s at 16 kHz; anything shorter is treated as silence.
const MIN_SAMPLES: usize = 8_000;

fn capture_err(e: impl std::fmt::Display) -> SpeechError {
    SpeechError::Capture(e.to_string())
}

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Microphone + Whisper speech recognizer.
pub struct WhisperRecognizer {
    ctx: Arc<WhisperContext>,
    capture_secs: f32,
}

impl WhisperRecognizer {
    /// Load the GGML model and confirm an input device exists.
    ///
    /// # Errors
    ///
    /// [`SpeechError::Unavailable`] when there is no input device;
    /// [`SpeechError::Capture`] when the model is missing or fails to load.
    pub fn load(model_path: &Path, capture_secs: f32) -> Result<Self, SpeechError> {
        if cpal::default_host().default_input_device().is_none() {
            return Err(SpeechError::Unavailable);
        }
        if !model_path.exists() {
            return Err(SpeechError::Capture(format!(
                "model not found: {}",
                model_path.display()
            )));
        }

        let path = model_path.to_str().ok_or_else(|| {
            SpeechError::Capture(format!("non-UTF-8 model path: {}", model_path.display()))
        })?;
        let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(capture_err)?;

        Ok(Self {
            ctx: Arc::new(ctx),
            capture_secs,
        })
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn listen(&self, locale_tag: &str) -> Result<String, SpeechError> {
        let ctx = Arc::clone(&self.ctx);
        let secs = self.capture_secs;
        let language = primary_subtag(locale_tag).to_string();

        tokio::task::spawn_blocking(move || {
            let audio = record(secs)?;
            if audio.len() < MIN_SAMPLES {
                return Err(SpeechError::NoSpeech);
            }
            transcribe(&ctx, &audio, &language)
        })
        .await
        .map_err(capture_err)?
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Record `secs` seconds from the default input device as 16 kHz mono.
fn record(secs: f32) -> Result<Vec<f32>, SpeechError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(SpeechError::Unavailable)?;
    let supported = device.default_input_config().map_err(capture_err)?;

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let (tx, rx) = mpsc::channel::<Vec<f32>>();
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.to_vec());
            },
            |err: cpal::StreamError| log::error!("speech: cpal stream error: {err}"),
            None,
        )
        .map_err(capture_err)?;
    stream.play().map_err(capture_err)?;

    let wanted = (secs * sample_rate as f32) as usize * channels as usize;
    let deadline = Instant::now() + Duration::from_secs_f32(secs + 2.0);
    let mut interleaved = Vec::with_capacity(wanted);

    while interleaved.len() < wanted {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => interleaved.extend_from_slice(&chunk),
            Err(_) => break,
        }
    }
    drop(stream);

    log::debug!(
        "speech: recorded {} samples @ {sample_rate} Hz × {channels}",
        interleaved.len()
    );
    Ok(resample_to_16k(&downmix(&interleaved, channels), sample_rate))
}

/// Average interleaved channels down to mono.
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

/// Linear-interpolation resample from `source_rate` to 16 kHz.
fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == WHISPER_RATE || samples.is_empty() || source_rate == 0 {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / WHISPER_RATE as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

fn transcribe(ctx: &WhisperContext, audio: &[f32], language: &str) -> Result<String, SpeechError> {
    let mut state = ctx.create_state().map_err(capture_err)?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(language));
    params.set_print_progress(false);
    params.set_print_realtime(false);

    state.full(params, audio).map_err(capture_err)?;

    let segments = state.full_n_segments().map_err(capture_err)?;
    let mut text = String::new();
    for i in 0..segments {
        text.push_str(&state.full_get_segment_text(i).map_err(capture_err)?);
    }
    Ok(text.trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
