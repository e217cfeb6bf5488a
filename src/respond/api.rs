//! Hosted response generation over HTTP.
//!
//! Sends the rendered transcript to an OpenAI-compatible `/chat/completions`
//! endpoint and returns the suggested reply.

use crate::defaults;
use crate::error::{Result, ConferError};
use crate::respond::engine::ResponseEngine;
use crate::respond::prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the hosted response engine.
#[derive(Debug, Clone)]
pub struct ApiResponseConfig {
    /// Base URL of the API (e.g. `https://api.openai.com/v1`).
    pub api_base: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiResponseConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::API_BASE.to_string(),
            api_key: String::new(),
            model: defaults::API_RESPONSE_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Hosted response engine.
pub struct ApiResponseEngine {
    config: ApiResponseConfig,
    client: reqwest::blocking::Client,
}

impl ApiResponseEngine {
    /// Create a new hosted engine.
    ///
    /// # Errors
    /// Returns `ConferError::Response` when no API key is configured or the
    /// HTTP client cannot be constructed.
    pub fn new(config: ApiResponseConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(ConferError::Response {
                message: format!("API key missing: set {}", defaults::API_KEY_ENV),
            });
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConferError::Response {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }
}

impl ResponseEngine for ApiResponseEngine {
    fn generate(&self, transcript: &str) -> Result<String> {
        let Some(user_prompt) = prompt::build_user_prompt(transcript) else {
            return Ok(String::new());
        };

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| ConferError::Response {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ConferError::Response {
                message: "Rate limited by API (429)".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ConferError::Response {
                message: format!("API returned {}: {}", status, body),
            });
        }

        let parsed: ChatResponse = response.json().map_err(|e| ConferError::Response {
            message: format!("Malformed API response: {}", e),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ConferError::Response {
                message: "API response contained no choices".to_string(),
            })?;

        Ok(prompt::clean_response(&content))
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
