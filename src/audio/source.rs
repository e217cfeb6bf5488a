use crate::defaults;
use crate::error::{Result, ConferError};
use std::collections::VecDeque;
use std::time::Duration;

/// Identity of an audio capture stream.
///
/// The assistant always runs exactly two streams: the local microphone and
/// the system speaker loopback. Every segment and utterance carries one of
/// these so text stays attributed end-to-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Mic,
    Speaker,
}

impl SourceId {
    /// Display label used in the merged transcript.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::Mic => "You",
            SourceId::Speaker => "Speaker",
        }
    }

    /// Short name for logging and error reporting.
    pub fn name(&self) -> &'static str {
        match self {
            SourceId::Mic => "mic",
            SourceId::Speaker => "speaker",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device vs mock).
/// `read_frames` blocks until frames arrive or the timeout elapses, so
/// capture workers suspend on source availability instead of busy-polling.
pub trait AudioSource: Send {
    /// Stable identity of this source.
    fn source_id(&self) -> SourceId;

    /// Nominal sample rate of the delivered frames in Hz.
    fn sample_rate(&self) -> u32;

    /// Channel count of the underlying device (delivered frames are mono).
    fn channels(&self) -> u16;

    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Wait up to `timeout` for the next batch of mono PCM frames.
    ///
    /// # Returns
    /// `Ok(Some(frames))` when frames arrived, `Ok(None)` on timeout,
    /// or an error when the stream has failed.
    fn read_frames(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>>;
}

/// Mock audio source for testing.
///
/// Delivers a configurable sequence of frame batches, then times out forever
/// (like a live device gone quiet). Failures can be injected at start, stop,
/// or at a specific read.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    source_id: SourceId,
    sample_rate: u32,
    is_started: bool,
    frames: VecDeque<Vec<i16>>,
    read_delay: Duration,
    should_fail_start: bool,
    fail_after_reads: Option<usize>,
    reads: usize,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock source with the given identity.
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            sample_rate: defaults::SAMPLE_RATE,
            is_started: false,
            frames: VecDeque::new(),
            read_delay: Duration::ZERO,
            should_fail_start: false,
            fail_after_reads: None,
            reads: 0,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the sample rate reported by the mock.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Queue a batch of frames to be returned by one `read_frames` call.
    pub fn with_frames(mut self, frames: Vec<i16>) -> Self {
        self.frames.push_back(frames);
        self
    }

    /// Queue several batches at once.
    pub fn with_frame_sequence(mut self, batches: Vec<Vec<i16>>) -> Self {
        self.frames.extend(batches);
        self
    }

    /// Pace delivery: each read sleeps this long before returning a batch,
    /// like a live device delivering in real time.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail after `n` successful reads.
    pub fn with_read_failure_after(mut self, n: usize) -> Self {
        self.fail_after_reads = Some(n);
        self
    }

    /// Configure the error message for injected failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl AudioSource for MockAudioSource {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        1
    }

    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(ConferError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_frames(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>> {
        if let Some(limit) = self.fail_after_reads
            && self.reads >= limit
        {
            return Err(ConferError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.reads += 1;

        match self.frames.pop_front() {
            Some(batch) => {
                if !self.read_delay.is_zero() {
                    std::thread::sleep(self.read_delay);
                }
                Ok(Some(batch))
            }
            None => {
                // Exhausted: behave like a quiet live device.
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}
