//! Response worker: periodically turns the transcript into a suggested reply.

use crate::pipeline::error::{ErrorReporter, WorkerError};
use crate::respond::engine::ResponseEngine;
use crate::respond::state::ResponseState;
use crate::transcript::Transcript;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Rate-limited generation loop.
///
/// Sleeps in small quanta and re-reads the interval each quantum, so a
/// runtime `set_update_interval` takes effect mid-cycle without restarting
/// the worker. Transcript access is a single snapshot render per cycle.
/// Engine failures are recoverable: the previous response is retained and the
/// next cycle retries. Publication respects the freeze flag.
pub struct ResponseWorker {
    transcript: Arc<Transcript>,
    state: Arc<ResponseState>,
    engine: Arc<dyn ResponseEngine>,
    running: Arc<AtomicBool>,
    reporter: Arc<dyn ErrorReporter>,
    quantum: Duration,
}

impl ResponseWorker {
    pub fn new(
        transcript: Arc<Transcript>,
        state: Arc<ResponseState>,
        engine: Arc<dyn ResponseEngine>,
        running: Arc<AtomicBool>,
        reporter: Arc<dyn ErrorReporter>,
        quantum: Duration,
    ) -> Self {
        Self {
            transcript,
            state,
            engine,
            running,
            reporter,
            quantum,
        }
    }

    /// Spawns the worker thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            // Interval is re-read every quantum so live adjustments apply.
            while self.running.load(Ordering::SeqCst)
                && cycle_start.elapsed() < self.state.interval()
            {
                thread::sleep(self.quantum);
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            let transcript_text = self.transcript.render();
            if transcript_text.trim().is_empty() {
                continue;
            }

            match self.engine.generate(&transcript_text) {
                Ok(response) => {
                    let response = response.trim();
                    if !response.is_empty() {
                        // Returns false while frozen; the previous response
                        // stays on display and computation simply continues.
                        self.state.publish(response.to_string());
                    }
                }
                Err(e) => {
                    self.reporter
                        .report("response", &WorkerError::Recoverable(e.to_string()));
                }
            }
        }
    }
}
