//! Error types and reporting for pipeline workers.

use std::fmt;

/// Errors that can occur inside a worker loop.
#[derive(Debug, Clone)]
pub enum WorkerError {
    /// Recoverable error that allows the worker to continue processing.
    Recoverable(String),
    /// Fatal error that requires the worker to shut down.
    Fatal(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            WorkerError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}

/// Trait for reporting worker errors.
///
/// Errors are always caught at the worker boundary; reporters decide what the
/// operator sees. No error from one worker may crash another worker's thread.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a worker.
    fn report(&self, worker: &str, error: &WorkerError);
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, worker: &str, error: &WorkerError) {
        eprintln!("[{}] {}", worker, error);
    }
}

/// Test support: reporter that records everything for assertions.
#[cfg(test)]
pub(crate) mod testing {
    use super::{ErrorReporter, WorkerError};
    use std::sync::{Arc, Mutex};

    pub struct RecordingReporter {
        pub reports: Mutex<Vec<(String, String)>>,
    }

    impl RecordingReporter {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                reports: Mutex::new(Vec::new()),
            })
        }
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, worker: &str, error: &WorkerError) {
            self.reports
                .lock()
                .expect("reports lock")
                .push((worker.to_string(), error.to_string()));
        }
    }
}
