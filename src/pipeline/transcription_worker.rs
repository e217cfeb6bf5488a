//! Transcription worker: drains the queue and grows the transcript.

use crate::audio::queue::AudioQueue;
use crate::defaults;
use crate::pipeline::error::{ErrorReporter, WorkerError};
use crate::stt::engine::TranscriptionEngine;
use crate::transcript::Transcript;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Single consumer of the shared queue.
///
/// Blocks on dequeue, invokes the engine per segment, and appends recognized
/// text under the segment's source id. Engine failures are recoverable: the
/// segment is discarded (audio is ephemeral, retrying cannot help) and the
/// worker moves on. Appends are validated against the clear generation
/// observed at dequeue so a clear issued mid-transcription wins.
pub struct TranscriptionWorker {
    queue: Arc<AudioQueue>,
    transcript: Arc<Transcript>,
    engine: Arc<dyn TranscriptionEngine>,
    running: Arc<AtomicBool>,
    reporter: Arc<dyn ErrorReporter>,
}

impl TranscriptionWorker {
    pub fn new(
        queue: Arc<AudioQueue>,
        transcript: Arc<Transcript>,
        engine: Arc<dyn TranscriptionEngine>,
        running: Arc<AtomicBool>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            queue,
            transcript,
            engine,
            running,
            reporter,
        }
    }

    /// Spawns the worker thread.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        let poll = Duration::from_millis(defaults::POLL_QUANTUM_MS);

        while self.running.load(Ordering::SeqCst) {
            let Some((segment, generation)) = self.queue.pop_timeout(poll) else {
                continue;
            };

            match self
                .engine
                .transcribe(&segment.samples, segment.sample_rate, segment.source)
            {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    self.transcript
                        .append_if_current(segment.source, text.to_string(), generation);
                }
                Err(e) => {
                    self.reporter.report(
                        "transcription",
                        &WorkerError::Recoverable(format!(
                            "segment from {} dropped: {}",
                            segment.source, e
                        )),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::SourceId;
    use crate::pipeline::error::LogReporter;
    use crate::pipeline::error::testing::RecordingReporter;
    use crate::pipeline::types::AudioSegment;
    use crate::stt::engine::MockTranscriptionEngine;

    fn wait_for(transcript: &Transcript, utterances: usize) {
        for _ in 0..100 {
            if transcript.len() >= utterances {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn spawn_worker(
        queue: &Arc<AudioQueue>,
        transcript: &Arc<Transcript>,
        engine: Arc<dyn TranscriptionEngine>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> (Arc<AtomicBool>, JoinHandle<()>) {
        let running = Arc::new(AtomicBool::new(true));
        let worker = TranscriptionWorker::new(
            queue.clone(),
            transcript.clone(),
            engine,
            running.clone(),
            reporter,
        );
        (running.clone(), worker.spawn())
    }

    #[test]
    fn test_worker_appends_recognized_text() {
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));
        let engine = Arc::new(MockTranscriptionEngine::new("mock").with_script(vec!["hello"]));

        let (running, handle) =
            spawn_worker(&queue, &transcript, engine, Arc::new(LogReporter));

        queue.push(AudioSegment::new(SourceId::Mic, vec![1; 160], 16000));
        wait_for(&transcript, 1);
        running.store(false, Ordering::SeqCst);
        handle.join().expect("worker thread");

        assert_eq!(transcript.render(), "You: hello");
    }

    #[test]
    fn test_worker_discards_empty_transcriptions() {
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));
        let engine = Arc::new(MockTranscriptionEngine::new("mock").with_response("   "));

        let (running, handle) =
            spawn_worker(&queue, &transcript, engine, Arc::new(LogReporter));

        queue.push(AudioSegment::new(SourceId::Mic, vec![1; 160], 16000));
        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::SeqCst);
        handle.join().expect("worker thread");

        assert!(transcript.is_empty());
    }

    #[test]
    fn test_engine_failure_does_not_halt_worker() {
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));
        let engine = Arc::new(MockTranscriptionEngine::new("mock").with_failure());
        let reporter = RecordingReporter::new();

        let (running, handle) = spawn_worker(&queue, &transcript, engine, reporter.clone());

        queue.push(AudioSegment::new(SourceId::Mic, vec![1; 160], 16000));
        queue.push(AudioSegment::new(SourceId::Speaker, vec![2; 160], 16000));
        thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::SeqCst);
        handle.join().expect("worker thread");

        // Both segments were consumed despite failures, and both were reported.
        assert!(queue.is_empty());
        let reports = reporter.reports.lock().expect("reports lock");
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|(w, _)| w == "transcription"));
        assert!(reports[0].1.contains("Recoverable"));
    }

    #[test]
    fn test_per_source_order_preserved() {
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));
        let engine = Arc::new(
            MockTranscriptionEngine::new("mock").with_script(vec!["one", "two", "three"]),
        );

        let (running, handle) =
            spawn_worker(&queue, &transcript, engine, Arc::new(LogReporter));

        for i in 0..3 {
            queue.push(AudioSegment::new(SourceId::Speaker, vec![i; 160], 16000));
        }
        wait_for(&transcript, 3);
        running.store(false, Ordering::SeqCst);
        handle.join().expect("worker thread");

        assert_eq!(
            transcript.render(),
            "Speaker: one\nSpeaker: two\nSpeaker: three"
        );
    }

    #[test]
    fn test_clear_between_dequeue_and_append_discards_text() {
        let queue = Arc::new(AudioQueue::new());
        let transcript = Arc::new(Transcript::new(queue.generation_handle()));

        // Simulate the race by hand: dequeue, then clear, then append with the
        // stale generation the worker would hold.
        queue.push(AudioSegment::new(SourceId::Mic, vec![1; 160], 16000));
        let (segment, generation) = queue.pop_timeout(Duration::from_millis(10)).expect("segment");

        queue.flush_with(|| transcript.reset());

        let appended =
            transcript.append_if_current(segment.source, "stale text".to_string(), generation);
        assert!(!appended);
        assert_eq!(transcript.render(), "");
    }
}
