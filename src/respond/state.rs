//! Shared response state polled by the presentation layer.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// The latest suggested response plus its refresh controls.
///
/// `latest` is written by the response worker and read by presentation.
/// `interval_ms` is adjustable at runtime without restarting the worker; the
/// worker re-reads it every sleep quantum. `frozen` is flipped only by the
/// operator toggle and consulted at publication time: while frozen the worker
/// keeps computing but the displayed response stops refreshing.
pub struct ResponseState {
    latest: Mutex<String>,
    interval_ms: AtomicU64,
    min_interval: Duration,
    max_interval: Duration,
    frozen: AtomicBool,
}

impl ResponseState {
    /// Creates a state with the given starting interval, clamped to `[min, max]`.
    pub fn new(interval: Duration, min_interval: Duration, max_interval: Duration) -> Self {
        let clamped = interval.clamp(min_interval, max_interval);
        Self {
            latest: Mutex::new(String::new()),
            interval_ms: AtomicU64::new(clamped.as_millis() as u64),
            min_interval,
            max_interval,
            frozen: AtomicBool::new(false),
        }
    }

    /// Snapshot of the latest published response.
    pub fn latest(&self) -> String {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Publish a new response unless display refresh is frozen.
    ///
    /// Returns true when the response was stored, false when frozen.
    pub fn publish(&self, response: String) -> bool {
        if self.frozen.load(Ordering::SeqCst) {
            return false;
        }
        let mut latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *latest = response;
        true
    }

    /// Current refresh interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::SeqCst))
    }

    /// Set the refresh interval, clamped to the configured bounds.
    ///
    /// Returns the interval actually applied.
    pub fn set_interval(&self, interval: Duration) -> Duration {
        let clamped = interval.clamp(self.min_interval, self.max_interval);
        self.interval_ms
            .store(clamped.as_millis() as u64, Ordering::SeqCst);
        clamped
    }

    /// Flip the freeze flag; returns the new value.
    ///
    /// Idempotent in the sense that two toggles restore the prior state and a
    /// toggle never touches capture or transcription.
    pub fn toggle_freeze(&self) -> bool {
        // fetch_xor flips atomically and returns the previous value.
        !self.frozen.fetch_xor(true, Ordering::SeqCst)
    }

    /// Whether display refresh is currently frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }
}
