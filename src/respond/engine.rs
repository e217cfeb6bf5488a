use crate::error::{Result, ConferError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Trait for suggested-response generation.
///
/// Given the rendered transcript, implementations produce the reply the
/// operator might want to give next. Failures (rate limit, auth, malformed
/// output) are recoverable per cycle: the worker keeps the previous response
/// and retries next cycle.
pub trait ResponseEngine: Send + Sync {
    /// Generate a suggested reply for the given transcript text.
    fn generate(&self, transcript: &str) -> Result<String>;

    /// Name of the backing engine for logging.
    fn name(&self) -> &str;
}

/// Implement ResponseEngine for Arc<T> so engines can be shared.
impl<T: ResponseEngine> ResponseEngine for Arc<T> {
    fn generate(&self, transcript: &str) -> Result<String> {
        (**self).generate(transcript)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock response engine for testing.
pub struct MockResponseEngine {
    name: String,
    response: String,
    script: Mutex<VecDeque<Result<String>>>,
    should_fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockResponseEngine {
    /// Create a new mock engine with default settings.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: "mock response".to_string(),
            script: Mutex::new(VecDeque::new()),
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to return a specific response on every call.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Queue per-call outcomes consumed in order; falls back to the fixed
    /// response when the script runs out.
    pub fn with_script(self, outcomes: Vec<Result<String>>) -> Self {
        {
            let mut script = match self.script.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            script.extend(outcomes);
        }
        self
    }

    /// Configure the mock to fail on every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Transcripts the engine has been called with, in order.
    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ResponseEngine for MockResponseEngine {
    fn generate(&self, transcript: &str) -> Result<String> {
        {
            let mut calls = match self.calls.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            calls.push(transcript.to_string());
        }

        if self.should_fail {
            return Err(ConferError::Response {
                message: "mock response failure".to_string(),
            });
        }

        let mut script = match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match script.pop_front() {
            Some(outcome) => outcome,
            None => Ok(self.response.clone()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
