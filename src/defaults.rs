//! Default configuration constants for confer.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default segment cadence in milliseconds.
///
/// Each capture worker accumulates this much audio before handing a segment
/// to the transcription queue. Three seconds keeps latency low while giving
/// the recognizer enough context for coherent phrases.
pub const SEGMENT_MS: u32 = 3000;

/// Default response refresh interval in seconds.
///
/// Two seconds keeps suggestions fresh without hammering the API; the
/// operator can adjust between the min and max bounds at runtime.
pub const RESPONSE_INTERVAL_SECS: u64 = 2;

/// Minimum allowed response refresh interval in seconds.
pub const MIN_RESPONSE_INTERVAL_SECS: u64 = 1;

/// Maximum allowed response refresh interval in seconds.
pub const MAX_RESPONSE_INTERVAL_SECS: u64 = 10;

/// Presentation poll cadence in milliseconds.
///
/// The display loop re-reads the transcript and latest response this often.
/// Independent of all worker cadences.
pub const UI_POLL_MS: u64 = 300;

/// Quantum for interruptible worker sleeps in milliseconds.
///
/// Workers sleep in slices of this size so shutdown and live interval
/// adjustments are observed promptly.
pub const POLL_QUANTUM_MS: u64 = 100;

/// Default Whisper model name for the local transcription backend.
pub const DEFAULT_MODEL: &str = "base.en";

/// Default language code for transcription.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default API base URL for hosted engines.
pub const API_BASE: &str = "https://api.openai.com/v1";

/// Default hosted transcription model.
pub const API_STT_MODEL: &str = "whisper-1";

/// Default hosted response model.
pub const API_RESPONSE_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the API key for hosted engines.
pub const API_KEY_ENV: &str = "CONFER_API_KEY";
