//! Assistant pipeline that runs from startup until shutdown.

use crate::audio::queue::AudioQueue;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::pipeline::capture_worker::CaptureWorker;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::response_worker::ResponseWorker;
use crate::pipeline::transcription_worker::TranscriptionWorker;
use crate::respond::engine::ResponseEngine;
use crate::respond::state::ResponseState;
use crate::stt::engine::TranscriptionEngine;
use crate::transcript::Transcript;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the assistant pipeline.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Segment cadence per capture worker, in milliseconds.
    pub segment_ms: u32,
    /// Starting response refresh interval.
    pub response_interval: Duration,
    /// Lower bound for the adjustable refresh interval.
    pub min_response_interval: Duration,
    /// Upper bound for the adjustable refresh interval.
    pub max_response_interval: Duration,
    /// Sleep quantum for interruptible worker waits.
    pub poll_quantum: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            segment_ms: defaults::SEGMENT_MS,
            response_interval: Duration::from_secs(defaults::RESPONSE_INTERVAL_SECS),
            min_response_interval: Duration::from_secs(defaults::MIN_RESPONSE_INTERVAL_SECS),
            max_response_interval: Duration::from_secs(defaults::MAX_RESPONSE_INTERVAL_SECS),
            poll_quantum: Duration::from_millis(defaults::POLL_QUANTUM_MS),
        }
    }
}

/// Handle to a running assistant pipeline.
///
/// Exposes the full outward control surface: snapshot reads for presentation
/// polling plus the two operator commands (freeze toggle, clear). All reads
/// are short-lock snapshots — presentation never waits on a worker.
pub struct AssistantHandle {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    queue: Arc<AudioQueue>,
    transcript: Arc<Transcript>,
    response: Arc<ResponseState>,
}

impl AssistantHandle {
    /// Snapshot of the merged transcript text.
    pub fn transcript_text(&self) -> String {
        self.transcript.render()
    }

    /// Snapshot of the latest suggested response.
    pub fn latest_response(&self) -> String {
        self.response.latest()
    }

    /// Adjust the response refresh interval at runtime (clamped to bounds).
    ///
    /// Returns the interval actually applied.
    pub fn set_update_interval(&self, interval: Duration) -> Duration {
        self.response.set_interval(interval)
    }

    /// Current response refresh interval.
    pub fn update_interval(&self) -> Duration {
        self.response.interval()
    }

    /// Toggle the response display freeze; returns the new state.
    ///
    /// Capture, transcription, and response computation are unaffected — only
    /// refresh of the displayed response is suppressed while frozen.
    pub fn toggle_freeze(&self) -> bool {
        self.response.toggle_freeze()
    }

    /// Whether response display refresh is currently frozen.
    pub fn is_frozen(&self) -> bool {
        self.response.is_frozen()
    }

    /// Atomically empty the transcript and flush all queued audio.
    ///
    /// Safe to call concurrently with an in-flight dequeue/append: the system
    /// ends up exactly as if no audio had been processed since the clear, with
    /// no stale text resurfacing afterwards. Returns the number of queued
    /// segments discarded.
    pub fn clear(&self) -> usize {
        self.queue.flush_with(|| self.transcript.reset())
    }

    /// Returns true while the pipeline is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of segments waiting for transcription.
    pub fn queued_segments(&self) -> usize {
        self.queue.len()
    }

    /// Stops the pipeline and joins worker threads with a bounded wait.
    ///
    /// Workers are daemon-like: after the deadline any remaining threads are
    /// detached and die with the process.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);

        let deadline = Instant::now() + Duration::from_secs(2);
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("confer: worker thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "confer: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }
    }
}

/// Assistant pipeline: two capture workers → queue → transcription → transcript
/// → response worker → latest-response slot.
pub struct Assistant {
    config: AssistantConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Assistant {
    /// Creates a new assistant with the default error reporter.
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts all workers and returns the control handle.
    ///
    /// Source startup happens on each capture worker's own thread, so a
    /// failing device degrades that one stream instead of aborting the
    /// pipeline (the reporter sees the fatal error).
    pub fn start(
        self,
        mic: Box<dyn AudioSource>,
        speaker: Box<dyn AudioSource>,
        stt_engine: Arc<dyn TranscriptionEngine>,
        response_engine: Arc<dyn ResponseEngine>,
    ) -> AssistantHandle {
        let running = Arc::new(AtomicBool::new(true));
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));
        let response = Arc::new(ResponseState::new(
            self.config.response_interval,
            self.config.min_response_interval,
            self.config.max_response_interval,
        ));

        let mut threads = Vec::with_capacity(4);

        for source in [mic, speaker] {
            let worker = CaptureWorker::new(
                source,
                queue.clone(),
                self.config.segment_ms,
                running.clone(),
                self.error_reporter.clone(),
            );
            threads.push(worker.spawn());
        }

        let transcription = TranscriptionWorker::new(
            queue.clone(),
            transcript.clone(),
            stt_engine,
            running.clone(),
            self.error_reporter.clone(),
        );
        threads.push(transcription.spawn());

        let responder = ResponseWorker::new(
            transcript.clone(),
            response.clone(),
            response_engine,
            running.clone(),
            self.error_reporter.clone(),
            self.config.poll_quantum,
        );
        threads.push(responder.spawn());

        AssistantHandle {
            running,
            threads,
            queue,
            transcript,
            response,
        }
    }
}
