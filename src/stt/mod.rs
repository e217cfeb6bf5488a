//! Speech-to-text engines.

pub mod api;
pub mod engine;
pub mod whisper;

pub use api::{ApiTranscriptionConfig, ApiTranscriptionEngine};
pub use engine::{MockTranscriptionEngine, TranscriptionEngine};
pub use whisper::{WhisperConfig, WhisperEngine};
