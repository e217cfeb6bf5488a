//! Audio capture sources and the shared segment queue.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod queue;
pub mod source;

pub use queue::AudioQueue;
pub use source::{AudioSource, MockAudioSource, SourceId};
