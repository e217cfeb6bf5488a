//! confer - Live conversation assistant for the desktop
//!
//! Captures microphone and speaker audio, transcribes both into one
//! speaker-attributed transcript, and periodically suggests a reply.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod respond;
pub mod stt;
pub mod sys;
pub mod transcript;

// L4 composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "cli"))]
pub mod app;

// Core traits (sources → engines → shared state)
pub use audio::source::{AudioSource, SourceId};
pub use respond::engine::ResponseEngine;
pub use stt::engine::TranscriptionEngine;

// Pipeline
pub use pipeline::orchestrator::{Assistant, AssistantConfig, AssistantHandle};

// Shared state
pub use audio::queue::AudioQueue;
pub use respond::state::ResponseState;
pub use transcript::{Transcript, Utterance};

// Error handling
pub use error::{Result, ConferError};

// Config
pub use config::{Config, SttBackend};

// Worker framework (for advanced users)
pub use pipeline::error::{ErrorReporter, LogReporter, WorkerError};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
