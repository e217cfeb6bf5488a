//! Shared segment queue between capture workers and the transcription worker.

use crate::pipeline::types::AudioSegment;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Multi-producer/single-consumer FIFO of audio segments.
///
/// Both capture workers push; only the transcription worker pops. The queue is
/// unbounded: capture must never drop a segment silently, so backpressure is
/// traded for memory growth (in practice bounded by transcription keeping up).
///
/// The queue also owns the pipeline's *clear generation*. [`flush_with`]
/// drains every pending segment and bumps the generation while holding the
/// queue lock, and [`pop_timeout`] reports the generation observed atomically
/// with each dequeue. A segment popped before a clear therefore always carries
/// a stale generation, which lets the transcript reject its text later — no
/// pre-clear audio can resurface after a clear, and nothing dequeued after the
/// clear is ever lost.
///
/// [`flush_with`]: AudioQueue::flush_with
/// [`pop_timeout`]: AudioQueue::pop_timeout
pub struct AudioQueue {
    inner: Mutex<VecDeque<AudioSegment>>,
    available: Condvar,
    generation: Arc<AtomicU64>,
}

impl AudioQueue {
    /// Creates an empty queue at generation zero.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared handle to the clear generation.
    ///
    /// The transcript holds this same counter to validate appends against
    /// clears that happened after a segment was dequeued.
    pub fn generation_handle(&self) -> Arc<AtomicU64> {
        self.generation.clone()
    }

    /// Enqueue a segment and wake the consumer.
    pub fn push(&self, segment: AudioSegment) {
        let mut queue = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.push_back(segment);
        self.available.notify_one();
    }

    /// Blocking dequeue with timeout.
    ///
    /// Suspends while the queue is empty and wakes on a new segment. Returns
    /// the segment together with the clear generation observed atomically with
    /// the dequeue, or `None` when the timeout elapses with nothing queued.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<(AudioSegment, u64)> {
        let mut queue = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if queue.is_empty() {
            let (guard, result) = match self.available.wait_timeout(queue, timeout) {
                Ok(pair) => pair,
                Err(poisoned) => {
                    let (guard, result) = poisoned.into_inner();
                    (guard, result)
                }
            };
            queue = guard;
            if result.timed_out() && queue.is_empty() {
                return None;
            }
        }

        // Generation is read while the queue lock is held, so a concurrent
        // flush (which holds the same lock for drain + bump) cannot interleave.
        queue
            .pop_front()
            .map(|segment| (segment, self.generation.load(Ordering::SeqCst)))
    }

    /// Drain all pending segments, advance the clear generation, and run `f`
    /// before releasing the queue lock.
    ///
    /// `f` is where the caller resets downstream state (the transcript) so the
    /// whole clear is one boundary: an in-flight push lands entirely before or
    /// entirely after it, never half-way.
    ///
    /// Returns the number of segments discarded.
    pub fn flush_with<F: FnOnce()>(&self, f: F) -> usize {
        let mut queue = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let discarded = queue.len();
        queue.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        f();
        discarded
    }

    /// Current clear generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Number of segments currently queued.
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns true when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AudioQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::SourceId;
    use std::sync::Arc;
    use std::thread;

    fn segment(source: SourceId, marker: i16) -> AudioSegment {
        AudioSegment::new(source, vec![marker], 16000)
    }

    #[test]
    fn test_push_pop_fifo_order() {
        let queue = AudioQueue::new();
        queue.push(segment(SourceId::Mic, 1));
        queue.push(segment(SourceId::Speaker, 2));
        queue.push(segment(SourceId::Mic, 3));

        let markers: Vec<i16> = (0..3)
            .map(|_| {
                queue
                    .pop_timeout(Duration::from_millis(10))
                    .expect("segment queued")
                    .0
                    .samples[0]
            })
            .collect();

        assert_eq!(markers, vec![1, 2, 3]);
    }

    #[test]
    fn test_pop_times_out_on_empty_queue() {
        let queue = AudioQueue::new();
        assert!(queue.pop_timeout(Duration::from_millis(5)).is_none());
    }

    #[test]
    fn test_pop_wakes_on_push_from_other_thread() {
        let queue = Arc::new(AudioQueue::new());
        let producer = queue.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(segment(SourceId::Mic, 42));
        });

        let popped = queue.pop_timeout(Duration::from_secs(2));
        handle.join().expect("producer thread");

        assert_eq!(popped.expect("segment").0.samples[0], 42);
    }

    #[test]
    fn test_flush_discards_pending_and_bumps_generation() {
        let queue = AudioQueue::new();
        queue.push(segment(SourceId::Mic, 1));
        queue.push(segment(SourceId::Speaker, 2));

        assert_eq!(queue.generation(), 0);
        let discarded = queue.flush_with(|| {});
        assert_eq!(discarded, 2);
        assert!(queue.is_empty());
        assert_eq!(queue.generation(), 1);
    }

    #[test]
    fn test_flush_runs_callback() {
        let queue = AudioQueue::new();
        let mut ran = false;
        queue.flush_with(|| ran = true);
        assert!(ran);
    }

    #[test]
    fn test_pop_before_flush_carries_stale_generation() {
        let queue = AudioQueue::new();
        queue.push(segment(SourceId::Mic, 1));

        let (_seg, generation) = queue.pop_timeout(Duration::from_millis(10)).expect("segment");
        queue.flush_with(|| {});

        assert_ne!(generation, queue.generation());
    }

    #[test]
    fn test_pop_after_flush_carries_current_generation() {
        let queue = AudioQueue::new();
        queue.push(segment(SourceId::Mic, 1));
        queue.flush_with(|| {});
        queue.push(segment(SourceId::Mic, 2));

        let (seg, generation) = queue.pop_timeout(Duration::from_millis(10)).expect("segment");
        assert_eq!(seg.samples[0], 2);
        assert_eq!(generation, queue.generation());
    }

    #[test]
    fn test_concurrent_producers_preserve_per_source_order() {
        let queue = Arc::new(AudioQueue::new());

        let mic_queue = queue.clone();
        let mic = thread::spawn(move || {
            for i in 0..50 {
                mic_queue.push(segment(SourceId::Mic, i));
            }
        });

        let speaker_queue = queue.clone();
        let speaker = thread::spawn(move || {
            for i in 0..50 {
                speaker_queue.push(segment(SourceId::Speaker, i));
            }
        });

        mic.join().expect("mic producer");
        speaker.join().expect("speaker producer");

        let mut mic_markers = Vec::new();
        let mut speaker_markers = Vec::new();
        while let Some((seg, _)) = queue.pop_timeout(Duration::from_millis(5)) {
            match seg.source {
                SourceId::Mic => mic_markers.push(seg.samples[0]),
                SourceId::Speaker => speaker_markers.push(seg.samples[0]),
            }
        }

        assert_eq!(mic_markers, (0..50).collect::<Vec<i16>>());
        assert_eq!(speaker_markers, (0..50).collect::<Vec<i16>>());
    }
}
