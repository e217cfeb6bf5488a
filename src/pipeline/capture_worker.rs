//! Capture worker: one per audio source, feeding the shared queue.

use crate::audio::queue::AudioQueue;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::pipeline::error::{ErrorReporter, WorkerError};
use crate::pipeline::types::AudioSegment;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pulls frames from one audio source and packages them into segments.
///
/// Runs for the lifetime of the process on a dedicated thread, blocking on
/// source availability. Segments are pushed at the configured cadence and are
/// never dropped silently: the queue is unbounded. A source failure is fatal
/// for this worker only — the other capture worker and all downstream stages
/// keep running with a single-source transcript.
pub struct CaptureWorker {
    source: Box<dyn AudioSource>,
    queue: Arc<AudioQueue>,
    segment_samples: usize,
    running: Arc<AtomicBool>,
    reporter: Arc<dyn ErrorReporter>,
}

impl CaptureWorker {
    /// Creates a worker that cuts segments every `segment_ms` of audio.
    pub fn new(
        source: Box<dyn AudioSource>,
        queue: Arc<AudioQueue>,
        segment_ms: u32,
        running: Arc<AtomicBool>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let segment_samples =
            (source.sample_rate() as u64 * segment_ms as u64 / 1000).max(1) as usize;
        Self {
            source,
            queue,
            segment_samples,
            running,
            reporter,
        }
    }

    /// Spawns the worker thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(mut self) {
        let source_id = self.source.source_id();
        let sample_rate = self.source.sample_rate();
        let worker_name = format!("capture:{}", source_id);
        let poll = Duration::from_millis(defaults::POLL_QUANTUM_MS);

        if let Err(e) = self.source.start() {
            self.reporter
                .report(&worker_name, &WorkerError::Fatal(e.to_string()));
            return;
        }

        let mut buffer: Vec<i16> = Vec::with_capacity(self.segment_samples);

        while self.running.load(Ordering::SeqCst) {
            match self.source.read_frames(poll) {
                Ok(Some(frames)) => {
                    buffer.extend_from_slice(&frames);
                    while buffer.len() >= self.segment_samples {
                        let rest = buffer.split_off(self.segment_samples);
                        let samples = std::mem::replace(&mut buffer, rest);
                        self.queue
                            .push(AudioSegment::new(source_id, samples, sample_rate));
                    }
                }
                Ok(None) => {
                    // Timeout: no frames yet, keep waiting.
                }
                Err(e) => {
                    self.reporter
                        .report(&worker_name, &WorkerError::Fatal(e.to_string()));
                    break;
                }
            }
        }

        // Flush the partial tail so shutdown loses nothing that was captured.
        if !buffer.is_empty() {
            self.queue
                .push(AudioSegment::new(source_id, buffer, sample_rate));
        }

        if let Err(e) = self.source.stop() {
            self.reporter
                .report(&worker_name, &WorkerError::Recoverable(e.to_string()));
        }
    }
}
