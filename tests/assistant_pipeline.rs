//! End-to-end pipeline tests with mock sources and engines.

use confer::audio::source::{AudioSource, MockAudioSource, SourceId};
use confer::error::{Result, ConferError};
use confer::pipeline::orchestrator::{Assistant, AssistantConfig};
use confer::respond::engine::ResponseEngine;
use confer::stt::engine::TranscriptionEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Transcription engine that derives text from the audio itself, so results
/// stay attributable no matter how the two capture streams interleave.
struct EchoEngine {
    /// Per-call latency, to hold segments in flight during clear tests.
    latency: Duration,
    /// Sample markers that should fail transcription.
    failing_markers: Vec<i16>,
}

impl EchoEngine {
    fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            failing_markers: Vec::new(),
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn with_failing_marker(mut self, marker: i16) -> Self {
        self.failing_markers.push(marker);
        self
    }
}

impl TranscriptionEngine for EchoEngine {
    fn transcribe(&self, samples: &[i16], _sample_rate: u32, source: SourceId) -> Result<String> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let marker = samples.first().copied().unwrap_or(0);
        if self.failing_markers.contains(&marker) {
            return Err(ConferError::Transcription {
                message: format!("injected failure for marker {}", marker),
            });
        }
        Ok(format!("{}-{}", source.name(), marker))
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Response engine that numbers its replies and records call times.
struct CountingResponder {
    calls: AtomicU64,
    call_times: Mutex<Vec<Instant>>,
}

impl CountingResponder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU64::new(0),
            call_times: Mutex::new(Vec::new()),
        })
    }

    fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().expect("call_times lock").clone()
    }
}

impl ResponseEngine for CountingResponder {
    fn generate(&self, _transcript: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.call_times
            .lock()
            .expect("call_times lock")
            .push(Instant::now());
        Ok(format!("response-{}", n))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn fast_config() -> AssistantConfig {
    AssistantConfig {
        // 10ms of audio at 16kHz = 160 samples per segment.
        segment_ms: 10,
        response_interval: Duration::from_millis(40),
        min_response_interval: Duration::from_millis(20),
        max_response_interval: Duration::from_millis(2000),
        poll_quantum: Duration::from_millis(5),
    }
}

fn marker_frames(markers: &[i16]) -> Vec<Vec<i16>> {
    markers.iter().map(|&m| vec![m; 160]).collect()
}

fn quiet_source(id: SourceId) -> Box<dyn AudioSource> {
    Box::new(MockAudioSource::new(id))
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

#[test]
fn per_source_fifo_is_preserved_across_interleavings() {
    let mic = Box::new(
        MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&[1, 2, 3, 4, 5])),
    );
    let speaker = Box::new(
        MockAudioSource::new(SourceId::Speaker)
            .with_frame_sequence(marker_frames(&[1, 2, 3, 4, 5])),
    );

    let handle = Assistant::new(fast_config()).start(
        mic,
        speaker,
        Arc::new(EchoEngine::new()),
        CountingResponder::new(),
    );

    assert!(wait_until(Duration::from_secs(5), || {
        let text = handle.transcript_text();
        text.matches("mic-").count() == 5 && text.matches("speaker-").count() == 5
    }));

    let text = handle.transcript_text();
    handle.stop();

    // Utterances for each source appear in capture order, whatever the
    // cross-source interleaving turned out to be.
    for prefix in ["You: mic-", "Speaker: speaker-"] {
        let positions: Vec<usize> = (1..=5)
            .map(|marker| {
                text.find(&format!("{}{}", prefix, marker))
                    .unwrap_or_else(|| panic!("missing {}{} in:\n{}", prefix, marker, text))
            })
            .collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "per-source order violated in:\n{}",
            text
        );
    }
}

#[test]
fn round_trip_labels_both_sources() {
    let mic =
        Box::new(MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&[7])));
    let speaker =
        Box::new(MockAudioSource::new(SourceId::Speaker).with_frame_sequence(marker_frames(&[9])));

    let handle = Assistant::new(fast_config()).start(
        mic,
        speaker,
        Arc::new(EchoEngine::new()),
        CountingResponder::new(),
    );

    assert!(wait_until(Duration::from_secs(5), || {
        handle.transcript_text().lines().count() >= 2
    }));

    let text = handle.transcript_text();
    handle.stop();

    assert!(text.contains("You: mic-7"), "got:\n{}", text);
    assert!(text.contains("Speaker: speaker-9"), "got:\n{}", text);
}

#[test]
fn transcription_failure_does_not_halt_the_worker() {
    let mic = Box::new(
        MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&[1, 13, 3])),
    );

    let handle = Assistant::new(fast_config()).start(
        mic,
        quiet_source(SourceId::Speaker),
        Arc::new(EchoEngine::new().with_failing_marker(13)),
        CountingResponder::new(),
    );

    assert!(wait_until(Duration::from_secs(5), || {
        handle.transcript_text().contains("mic-3")
    }));

    let text = handle.transcript_text();
    handle.stop();

    assert!(text.contains("You: mic-1"));
    assert!(!text.contains("mic-13"), "failed segment leaked: {}", text);
    assert!(text.contains("You: mic-3"));
}

#[test]
fn clear_empties_transcript_immediately_with_inflight_work() {
    // 40 segments, each taking ~5ms to transcribe: the clear lands mid-drain.
    let markers: Vec<i16> = (1..=40).collect();
    let mic =
        Box::new(MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&markers)));

    let handle = Assistant::new(fast_config()).start(
        mic,
        quiet_source(SourceId::Speaker),
        Arc::new(EchoEngine::new().with_latency(Duration::from_millis(5))),
        CountingResponder::new(),
    );

    // Let some transcription happen first.
    assert!(wait_until(Duration::from_secs(5), || {
        !handle.transcript_text().is_empty()
    }));

    handle.clear();
    assert_eq!(
        handle.transcript_text(),
        "",
        "clear must leave an empty transcript immediately"
    );

    // Nothing queued before the clear may resurface, even segments that were
    // in flight inside the engine when clear() returned.
    thread::sleep(Duration::from_millis(300));
    assert_eq!(
        handle.transcript_text(),
        "",
        "pre-clear audio resurrected after clear"
    );

    handle.stop();
}

#[test]
fn segments_dequeued_after_clear_are_all_processed() {
    let quiet = quiet_source(SourceId::Speaker);
    // No frames initially: we drive the queue through a paused source and the
    // transcript via post-clear captures only.
    let pre_markers: Vec<i16> = (1..=30).collect();
    let post_markers: Vec<i16> = (101..=110).collect();

    let mut frames = marker_frames(&pre_markers);
    frames.extend(marker_frames(&post_markers));
    // Paced delivery: the clear lands while later frames are still arriving,
    // so the post-clear markers reach the queue strictly after the boundary.
    let mic = Box::new(
        MockAudioSource::new(SourceId::Mic)
            .with_frame_sequence(frames)
            .with_read_delay(Duration::from_millis(10)),
    );

    let handle = Assistant::new(fast_config()).start(
        mic,
        quiet,
        Arc::new(EchoEngine::new().with_latency(Duration::from_millis(3))),
        CountingResponder::new(),
    );

    // Wait until the post-clear markers start flowing, clearing repeatedly
    // until only post-clear content can remain.
    assert!(wait_until(Duration::from_secs(5), || {
        handle.transcript_text().contains("mic-10")
    }));
    handle.clear();

    // Everything appended from here on must be post-clear segments, exactly
    // once each, in order.
    assert!(wait_until(Duration::from_secs(5), || {
        handle.transcript_text().contains("mic-110")
    }));

    let text = handle.transcript_text();
    handle.stop();

    for line in text.lines() {
        let marker: i16 = line
            .trim_start_matches("You: mic-")
            .parse()
            .unwrap_or_else(|_| panic!("unexpected line: {}", line));
        assert!(
            (101..=110).contains(&marker) || (1..=30).contains(&marker),
            "unknown marker {}",
            marker
        );
    }

    // The boundary accounting: every segment dequeued after the clear was
    // appended exactly once (no double-processing, no loss).
    for marker in 101..=110 {
        assert_eq!(
            text.matches(&format!("mic-{}", marker)).count(),
            1,
            "marker {} should appear exactly once in:\n{}",
            marker,
            text
        );
    }
}

#[test]
fn freeze_pins_the_displayed_response_until_unfrozen() {
    let mic =
        Box::new(MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&[1])));
    let responder = CountingResponder::new();

    let handle = Assistant::new(fast_config()).start(
        mic,
        quiet_source(SourceId::Speaker),
        Arc::new(EchoEngine::new()),
        responder.clone(),
    );

    // Wait for the first published response.
    assert!(wait_until(Duration::from_secs(5), || {
        !handle.latest_response().is_empty()
    }));

    assert!(handle.toggle_freeze());
    let pinned = handle.latest_response();
    let calls_at_freeze = responder.call_times().len();

    // At least three response cycles pass while frozen.
    assert!(wait_until(Duration::from_secs(5), || {
        responder.call_times().len() >= calls_at_freeze + 3
    }));
    assert_eq!(
        handle.latest_response(),
        pinned,
        "response must not change while frozen"
    );

    // Unfreezing resumes updates within one cycle.
    assert!(!handle.toggle_freeze());
    assert!(wait_until(Duration::from_secs(5), || {
        handle.latest_response() != pinned
    }));

    handle.stop();
}

#[test]
fn update_interval_governs_publication_gap() {
    let mic =
        Box::new(MockAudioSource::new(SourceId::Mic).with_frame_sequence(marker_frames(&[1])));
    let responder = CountingResponder::new();

    let mut config = fast_config();
    config.response_interval = Duration::from_millis(100);
    let handle = Assistant::new(config).start(
        mic,
        quiet_source(SourceId::Speaker),
        Arc::new(EchoEngine::new()),
        responder.clone(),
    );

    assert!(wait_until(Duration::from_secs(5), || {
        responder.call_times().len() >= 4
    }));
    handle.stop();

    let times = responder.call_times();
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        // Lower bound is the contract; the upper bound allows scheduler slack
        // on top of interval + one polling quantum.
        assert!(
            gap >= Duration::from_millis(95),
            "publication gap {:?} shorter than the interval",
            gap
        );
        assert!(
            gap <= Duration::from_millis(600),
            "publication gap {:?} far exceeds interval + quantum",
            gap
        );
    }
}

#[test]
fn set_update_interval_clamps_and_applies() {
    let handle = Assistant::new(fast_config()).start(
        quiet_source(SourceId::Mic),
        quiet_source(SourceId::Speaker),
        Arc::new(EchoEngine::new()),
        CountingResponder::new(),
    );

    assert_eq!(
        handle.set_update_interval(Duration::from_millis(1)),
        Duration::from_millis(20),
        "below-minimum interval should clamp up"
    );
    assert_eq!(
        handle.set_update_interval(Duration::from_secs(60)),
        Duration::from_millis(2000),
        "above-maximum interval should clamp down"
    );
    assert_eq!(
        handle.set_update_interval(Duration::from_millis(500)),
        Duration::from_millis(500)
    );
    assert_eq!(handle.update_interval(), Duration::from_millis(500));

    handle.stop();
}
