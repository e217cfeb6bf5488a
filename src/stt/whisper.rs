//! Whisper-based local speech-to-text.
//!
//! This module provides a Whisper implementation of the TranscriptionEngine
//! trait using whisper-rs.
//!
//! # Feature Gate
//!
//! Real inference requires the `whisper` feature (and cmake to build):
//!
//! ```bash
//! cargo build --features whisper
//! ```
//!
//! Without the feature a stub with the same constructor exists so callers can
//! surface a helpful error instead of failing to compile.

use crate::audio::source::SourceId;
use crate::defaults;
use crate::error::{Result, ConferError};
use crate::stt::engine::TranscriptionEngine;
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Sample rate Whisper models expect.
#[cfg(feature = "whisper")]
const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Configuration for the local Whisper engine.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file.
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "de"), or "auto" for detection.
    pub language: String,
    /// Number of threads for inference (None = auto-detect).
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
        }
    }
}

/// Local Whisper transcription engine.
///
/// The WhisperContext is wrapped in a Mutex: the transcription worker is the
/// only caller, but the trait is `Sync` so the lock keeps misuse impossible.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

/// Local Whisper engine placeholder (without the `whisper` feature).
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    config: WhisperConfig,
    model_name: String,
}

fn model_name_from_path(path: &PathBuf) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Create a new Whisper engine.
    ///
    /// # Errors
    /// Returns `ConferError::TranscriptionModelNotFound` if the model file
    /// doesn't exist, `ConferError::Transcription` if loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(ConferError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_from_path(&config.model_path);

        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| ConferError::Transcription {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| ConferError::Transcription {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Create a new Whisper engine (stub without the `whisper` feature).
    pub fn new(config: WhisperConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(ConferError::TranscriptionModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }
        let model_name = model_name_from_path(&config.model_path);
        Ok(Self { config, model_name })
    }
}

impl WhisperEngine {
    /// Get the configuration.
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0].
    ///
    /// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
    pub fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(feature = "whisper")]
impl TranscriptionEngine for WhisperEngine {
    fn transcribe(&self, samples: &[i16], sample_rate: u32, _source: SourceId) -> Result<String> {
        if sample_rate != WHISPER_SAMPLE_RATE {
            return Err(ConferError::Transcription {
                message: format!(
                    "Whisper requires {} Hz audio, got {} Hz",
                    WHISPER_SAMPLE_RATE, sample_rate
                ),
            });
        }

        let audio_f32 = Self::convert_audio(samples);

        let context = self
            .context
            .lock()
            .map_err(|e| ConferError::Transcription {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context.create_state().map_err(|e| ConferError::Transcription {
            message: format!("Failed to create Whisper state: {}", e),
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| ConferError::Transcription {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut transcription = String::new();
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
        }

        Ok(transcription.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl TranscriptionEngine for WhisperEngine {
    fn transcribe(&self, _samples: &[i16], _sample_rate: u32, _source: SourceId) -> Result<String> {
        Err(ConferError::Transcription {
            message: "Local transcription requires the 'whisper' feature. \
                      Rebuild with --features whisper, or run with --api."
                .to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
