//! Concurrent pipeline for capture, transcription, and response generation.
//!
//! One dedicated thread per long-running worker (two capture workers, one
//! transcription worker, one response worker), communicating exclusively
//! through the shared queue, transcript, and response state.

pub mod capture_worker;
pub mod error;
pub mod orchestrator;
pub mod response_worker;
pub mod transcription_worker;
pub mod types;

pub use capture_worker::CaptureWorker;
pub use error::{ErrorReporter, LogReporter, WorkerError};
pub use orchestrator::{Assistant, AssistantConfig, AssistantHandle};
pub use response_worker::ResponseWorker;
pub use transcription_worker::TranscriptionWorker;
pub use types::AudioSegment;
