//! Hosted speech-to-text over HTTP.
//!
//! Uploads each segment as an in-memory WAV to an OpenAI-compatible
//! `/audio/transcriptions` endpoint. Selected with the `--api` flag or
//! `[stt] backend = "api"`.

use crate::audio::source::SourceId;
use crate::defaults;
use crate::error::{Result, ConferError};
use crate::stt::engine::TranscriptionEngine;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

/// Configuration for the hosted transcription engine.
#[derive(Debug, Clone)]
pub struct ApiTranscriptionConfig {
    /// Base URL of the API (e.g. `https://api.openai.com/v1`).
    pub api_base: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Language hint; `"auto"` omits the hint.
    pub language: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiTranscriptionConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::API_BASE.to_string(),
            api_key: String::new(),
            model: defaults::API_STT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Hosted transcription engine.
pub struct ApiTranscriptionEngine {
    config: ApiTranscriptionConfig,
    client: reqwest::blocking::Client,
}

impl ApiTranscriptionEngine {
    /// Create a new hosted engine.
    ///
    /// # Errors
    /// Returns `ConferError::Transcription` when no API key is configured or
    /// the HTTP client cannot be constructed.
    pub fn new(config: ApiTranscriptionConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ConferError::Transcription {
                message: format!("API key missing: set {}", defaults::API_KEY_ENV),
            });
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConferError::Transcription {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    /// Encode mono PCM samples as a WAV file in memory.
    fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec).map_err(|e| {
                ConferError::Transcription {
                    message: format!("WAV encoding failed: {}", e),
                }
            })?;
            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| ConferError::Transcription {
                        message: format!("WAV encoding failed: {}", e),
                    })?;
            }
            writer.finalize().map_err(|e| ConferError::Transcription {
                message: format!("WAV encoding failed: {}", e),
            })?;
        }
        Ok(buffer.into_inner())
    }
}

impl TranscriptionEngine for ApiTranscriptionEngine {
    fn transcribe(&self, samples: &[i16], sample_rate: u32, source: SourceId) -> Result<String> {
        let wav = Self::encode_wav(samples, sample_rate)?;

        let part = Part::bytes(wav)
            .file_name(format!("{}.wav", source.name()))
            .mime_str("audio/wav")
            .map_err(|e| ConferError::Transcription {
                message: format!("Invalid upload part: {}", e),
            })?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());
        if self.config.language != defaults::AUTO_LANGUAGE {
            form = form.text("language", self.config.language.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .map_err(|e| ConferError::Transcription {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ConferError::Transcription {
                message: format!("API returned {}: {}", status, body),
            });
        }

        let parsed: TranscriptionResponse =
            response.json().map_err(|e| ConferError::Transcription {
                message: format!("Malformed API response: {}", e),
            })?;

        Ok(parsed.text)
    }

    fn name(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}
