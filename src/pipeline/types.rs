//! Data types moving through the capture/transcription pipeline.

use crate::audio::source::SourceId;
use std::time::Instant;

/// A bounded chunk of captured audio with source attribution and capture time.
///
/// Immutable once enqueued: created by a capture worker, consumed exactly once
/// by the transcription worker, then discarded.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Which stream this audio came from.
    pub source: SourceId,
    /// Mono PCM samples (16-bit signed integers).
    pub samples: Vec<i16>,
    /// Sample rate the samples were captured at.
    pub sample_rate: u32,
    /// Timestamp when the segment was assembled.
    pub captured_at: Instant,
}

impl AudioSegment {
    /// Creates a new audio segment stamped with the current time.
    pub fn new(source: SourceId, samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            source,
            samples,
            sample_rate,
            captured_at: Instant::now(),
        }
    }

    /// Duration of the segment in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000 / self.sample_rate as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_creation() {
        let segment = AudioSegment::new(SourceId::Mic, vec![1, 2, 3], 16000);

        assert_eq!(segment.source, SourceId::Mic);
        assert_eq!(segment.samples, vec![1, 2, 3]);
        assert_eq!(segment.sample_rate, 16000);
        assert!(segment.captured_at <= Instant::now());
    }

    #[test]
    fn test_segment_duration() {
        let segment = AudioSegment::new(SourceId::Speaker, vec![0; 16000], 16000);
        assert_eq!(segment.duration_ms(), 1000);

        let half = AudioSegment::new(SourceId::Speaker, vec![0; 8000], 16000);
        assert_eq!(half.duration_ms(), 500);
    }

    #[test]
    fn test_segment_duration_zero_rate() {
        let segment = AudioSegment::new(SourceId::Mic, vec![0; 100], 0);
        assert_eq!(segment.duration_ms(), 0);
    }
}
