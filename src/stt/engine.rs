use crate::audio::source::SourceId;
use crate::error::{Result, ConferError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (local Whisper, hosted API, mock).
/// Implementations must be callable from the transcription worker thread while
/// other threads hold references, hence `Send + Sync`.
pub trait TranscriptionEngine: Send + Sync {
    /// Transcribe one audio segment to text.
    ///
    /// # Arguments
    /// * `samples` - Mono audio samples as 16-bit PCM
    /// * `sample_rate` - Sample rate the audio was captured at
    /// * `source` - Which stream the audio came from
    ///
    /// # Returns
    /// Recognized text (possibly empty for silence) or a transcription error.
    fn transcribe(&self, samples: &[i16], sample_rate: u32, source: SourceId) -> Result<String>;

    /// Name of the backing engine for logging.
    fn name(&self) -> &str;

    /// Check if the engine is ready to accept audio.
    fn is_ready(&self) -> bool;
}

/// Implement TranscriptionEngine for Arc<T> so engines can be shared.
impl<T: TranscriptionEngine> TranscriptionEngine for Arc<T> {
    fn transcribe(&self, samples: &[i16], sample_rate: u32, source: SourceId) -> Result<String> {
        (**self).transcribe(samples, sample_rate, source)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcription engine for testing.
///
/// Returns a fixed response, or a scripted sequence consumed one call at a
/// time. Failure injection covers the per-segment error path.
pub struct MockTranscriptionEngine {
    name: String,
    response: String,
    script: Mutex<VecDeque<String>>,
    should_fail: bool,
}

impl MockTranscriptionEngine {
    /// Create a new mock engine with default settings.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: "mock transcription".to_string(),
            script: Mutex::new(VecDeque::new()),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific response on every call.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Queue responses consumed in order; falls back to the fixed response
    /// when the script runs out.
    pub fn with_script(self, responses: Vec<&str>) -> Self {
        {
            let mut script = match self.script.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            script.extend(responses.into_iter().map(String::from));
        }
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl TranscriptionEngine for MockTranscriptionEngine {
    fn transcribe(&self, _samples: &[i16], _sample_rate: u32, _source: SourceId) -> Result<String> {
        if self.should_fail {
            return Err(ConferError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }
        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(script.pop_front().unwrap_or_else(|| self.response.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
