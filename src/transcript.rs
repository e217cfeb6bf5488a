//! Shared, speaker-attributed transcript of both conversation sides.

use crate::audio::source::SourceId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// A unit of recognized text attributed to one source.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// The recognized text.
    pub text: String,
    /// Timestamp when the text arrived from the transcription engine.
    pub received_at: Instant,
}

impl Utterance {
    /// Creates a new utterance stamped with the current time.
    pub fn new(text: String) -> Self {
        Self {
            text,
            received_at: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct TranscriptInner {
    mic: Vec<Utterance>,
    speaker: Vec<Utterance>,
}

impl TranscriptInner {
    fn sequence_mut(&mut self, source: SourceId) -> &mut Vec<Utterance> {
        match source {
            SourceId::Mic => &mut self.mic,
            SourceId::Speaker => &mut self.speaker,
        }
    }
}

/// The merged record of both speakers' recognized speech.
///
/// Written only by the transcription worker; read concurrently by the
/// presentation layer and the response worker through short-lock snapshots.
/// Per-source utterance order is append order; the rendered merge interleaves
/// the two sequences by arrival time (ties: mic first).
///
/// Appends are validated against the queue's clear generation: text produced
/// from a segment dequeued before a clear is rejected, so a freshly cleared
/// transcript never resurrects stale audio.
pub struct Transcript {
    inner: Mutex<TranscriptInner>,
    generation: Arc<AtomicU64>,
}

impl Transcript {
    /// Creates an empty transcript bound to the queue's clear generation.
    pub fn new(generation: Arc<AtomicU64>) -> Self {
        Self {
            inner: Mutex::new(TranscriptInner::default()),
            generation,
        }
    }

    /// Creates a standalone transcript with its own generation counter.
    ///
    /// Useful in tests and anywhere no queue is involved.
    pub fn detached() -> Self {
        Self::new(Arc::new(AtomicU64::new(0)))
    }

    /// Append recognized text for `source` if `generation` is still current.
    ///
    /// Returns true when the utterance was appended, false when it was
    /// rejected as stale (a clear happened after the segment was dequeued).
    /// The whole operation is one lock acquisition, so readers never observe
    /// a partial update.
    pub fn append_if_current(&self, source: SourceId, text: String, generation: u64) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Checked under the same lock that reset() takes, so the decision and
        // the append are atomic with respect to a concurrent clear.
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        inner.sequence_mut(source).push(Utterance::new(text));
        true
    }

    /// Atomically empty both per-source sequences.
    pub fn reset(&self) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.mic.clear();
        inner.speaker.clear();
    }

    /// Number of utterances currently held for `source`.
    pub fn utterance_count(&self, source: SourceId) -> usize {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match source {
            SourceId::Mic => inner.mic.len(),
            SourceId::Speaker => inner.speaker.len(),
        }
    }

    /// Total number of utterances across both sources.
    pub fn len(&self) -> usize {
        let inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.mic.len() + inner.speaker.len()
    }

    /// Returns true when no utterances have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot-render the merged transcript.
    ///
    /// One line per utterance, `"{label}: {text}"`, interleaved by arrival
    /// time across the two sources (mic wins ties), oldest first. The lock is
    /// held only long enough to clone the utterances.
    pub fn render(&self) -> String {
        let (mic, speaker) = {
            let inner = match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            (inner.mic.clone(), inner.speaker.clone())
        };

        let mut lines = Vec::with_capacity(mic.len() + speaker.len());
        let mut m = mic.iter().peekable();
        let mut s = speaker.iter().peekable();

        loop {
            match (m.peek(), s.peek()) {
                (Some(mu), Some(su)) => {
                    if mu.received_at <= su.received_at {
                        lines.push(format_line(SourceId::Mic, mu));
                        m.next();
                    } else {
                        lines.push(format_line(SourceId::Speaker, su));
                        s.next();
                    }
                }
                (Some(mu), None) => {
                    lines.push(format_line(SourceId::Mic, mu));
                    m.next();
                }
                (None, Some(su)) => {
                    lines.push(format_line(SourceId::Speaker, su));
                    s.next();
                }
                (None, None) => break,
            }
        }

        lines.join("\n")
    }
}

fn format_line(source: SourceId, utterance: &Utterance) -> String {
    format!("{}: {}", source.label(), utterance.text)
}
