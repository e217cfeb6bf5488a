//! Real audio capture using CPAL (Cross-Platform Audio Library).
//!
//! Two constructors cover the assistant's two streams: [`CpalSource::mic`]
//! opens a regular input device, [`CpalSource::speaker`] opens the system
//! loopback (a monitor source on PipeWire/PulseAudio). Frames flow from the
//! CPAL callback through a channel, so `read_frames` blocks on availability
//! instead of busy-polling.

use crate::audio::source::{AudioSource, SourceId};
use crate::defaults;
use crate::error::{Result, ConferError};
use crate::sys::with_suppressed_stderr;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Preferred device names for GNOME/PipeWire environments.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns that mark a speaker loopback input.
const MONITOR_PATTERNS: &[&str] = &["monitor", "loopback", "stereo mix"];

/// Device name patterns to filter out (not useful for capture).
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

fn is_monitor_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    MONITOR_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// List all available audio input devices with filtering and recommendations.
///
/// Preferred devices are marked with "\[recommended\]", loopback inputs with
/// "\[monitor\]". Obviously unusable devices (surround channels, HDMI, etc.)
/// are filtered out.
///
/// # Errors
/// Returns `ConferError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| ConferError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_monitor_device(&name) {
                device_names.push(format!("{} [monitor]", name));
            } else if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Find an input device by exact name.
fn find_device_by_name(host: &cpal::Host, name: &str) -> Result<cpal::Device> {
    let devices = host.input_devices().map_err(|e| ConferError::AudioCapture {
        message: format!("Failed to enumerate devices: {}", e),
    })?;

    for device in devices {
        if let Ok(dev_name) = device.name()
            && dev_name == name
        {
            return Ok(device);
        }
    }

    Err(ConferError::AudioDeviceNotFound {
        device: name.to_string(),
    })
}

/// Get the best default input device, preferring PipeWire/PulseAudio.
fn get_best_default_device(host: &cpal::Host) -> Result<cpal::Device> {
    if let Ok(devices) = host.input_devices() {
        for device in devices {
            if let Ok(name) = device.name()
                && is_preferred_device(&name)
            {
                return Ok(device);
            }
        }
    }

    host.default_input_device()
        .ok_or_else(|| ConferError::AudioDeviceNotFound {
            device: "default".to_string(),
        })
}

/// Find a loopback/monitor input for speaker capture.
fn find_monitor_device(host: &cpal::Host) -> Result<cpal::Device> {
    if let Ok(devices) = host.input_devices() {
        for device in devices {
            if let Ok(name) = device.name()
                && is_monitor_device(&name)
                && !should_filter_device(&name)
            {
                return Ok(device);
            }
        }
    }

    Err(ConferError::AudioDeviceNotFound {
        device: "speaker monitor (no loopback input found; \
                 pass --speaker-device or enable a monitor source)"
            .to_string(),
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only created and dropped from the capture worker's
/// thread; the wrapper exists so the owning source can move into that thread.
struct SendableStream(cpal::Stream);

// SAFETY: see SendableStream docs — access stays on one thread at a time.
unsafe impl Send for SendableStream {}

/// Real audio capture implementation using CPAL.
///
/// Captures 16-bit PCM at 16kHz mono. Tries the preferred format first
/// (i16/16kHz/mono), then f32, then falls back to the device's native config
/// with software conversion (channel mixing + resampling).
pub struct CpalSource {
    source_id: SourceId,
    device: cpal::Device,
    stream: Mutex<Option<SendableStream>>,
    frames_tx: Sender<Vec<i16>>,
    frames_rx: Receiver<Vec<i16>>,
    stream_error: Arc<Mutex<Option<String>>>,
    sample_rate: u32,
    channels: u16,
}

impl CpalSource {
    /// Open the microphone stream.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the best default.
    pub fn mic(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            match device_name {
                Some(name) => find_device_by_name(&host, name),
                None => get_best_default_device(&host),
            }
        })?;
        Self::from_device(SourceId::Mic, device)
    }

    /// Open the speaker loopback stream.
    ///
    /// # Arguments
    /// * `device_name` - Optional monitor device name. If None, auto-detects a
    ///   monitor/loopback input.
    pub fn speaker(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            match device_name {
                Some(name) => find_device_by_name(&host, name),
                None => find_monitor_device(&host),
            }
        })?;
        Self::from_device(SourceId::Speaker, device)
    }

    fn from_device(source_id: SourceId, device: cpal::Device) -> Result<Self> {
        let channels = device
            .default_input_config()
            .map(|config| config.channels())
            .unwrap_or(1);
        let (frames_tx, frames_rx) = unbounded();

        Ok(Self {
            source_id,
            device,
            stream: Mutex::new(None),
            frames_tx,
            frames_rx,
            stream_error: Arc::new(Mutex::new(None)),
            sample_rate: defaults::SAMPLE_RATE,
            channels,
        })
    }

    /// Build the audio stream with the configured format.
    ///
    /// Tries in order:
    /// 1. i16/16kHz/mono — preferred, zero-copy path
    /// 2. f32/16kHz/mono — for devices that only expose float formats
    /// 3. Device default config — native rate/channels with software conversion
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let error_slot = Arc::clone(&self.stream_error);
        let err_callback = move |err: cpal::StreamError| {
            if let Ok(mut slot) = error_slot.lock() {
                *slot = Some(err.to_string());
            }
        };

        let tx = self.frames_tx.clone();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.to_vec());
            },
            err_callback.clone(),
            None,
        ) {
            return Ok(stream);
        }

        let tx = self.frames_tx.clone();
        if let Ok(stream) = self.device.build_input_stream(
            &preferred_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                let _ = tx.send(converted);
            },
            err_callback.clone(),
            None,
        ) {
            return Ok(stream);
        }

        self.build_stream_native(err_callback)
    }

    /// Build a stream using the device's native config, with software channel
    /// mixing (N channels → mono) and resampling (native rate → 16kHz).
    fn build_stream_native(
        &self,
        err_callback: impl FnMut(cpal::StreamError) + Send + Clone + 'static,
    ) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| ConferError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        match default_config.sample_format() {
            SampleFormat::I16 => {
                let tx = self.frames_tx.clone();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            let converted = convert_to_mono_target_rate(
                                data,
                                native_channels,
                                native_rate,
                                target_rate,
                            );
                            let _ = tx.send(converted);
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| ConferError::AudioCapture {
                        message: format!("Failed to build native i16 stream: {}", e),
                    })
            }
            SampleFormat::F32 => {
                let tx = self.frames_tx.clone();
                self.device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            let i16_data: Vec<i16> = data
                                .iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                                .collect();
                            let converted = convert_to_mono_target_rate(
                                &i16_data,
                                native_channels,
                                native_rate,
                                target_rate,
                            );
                            let _ = tx.send(converted);
                        },
                        err_callback,
                        None,
                    )
                    .map_err(|e| ConferError::AudioCapture {
                        message: format!("Failed to build native f32 stream: {}", e),
                    })
            }
            fmt => Err(ConferError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device explicitly.",
                    fmt
                ),
            }),
        }
    }

    fn take_stream_error(&self) -> Option<String> {
        match self.stream_error.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_target_rate(
    samples: &[i16],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<i16> {
    let mono: Vec<i16> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        resample(&mono, source_rate, target_rate)
    }
}

/// Linear-interpolation resampler.
///
/// Adequate for speech going into a recognizer; not a general-purpose
/// high-fidelity converter.
fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }
    if source_rate == target_rate {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / ratio).floor() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let position = i as f64 * ratio;
        let index = position as usize;
        let frac = position - index as f64;

        let current = samples[index] as f64;
        let next = samples.get(index + 1).copied().unwrap_or(samples[index]) as f64;
        output.push((current + (next - current) * frac) as i16);
    }

    output
}

impl AudioSource for CpalSource {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn start(&mut self) -> Result<()> {
        {
            let guard = match self.stream.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| ConferError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut guard = match self.stream.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut guard = match self.stream.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| ConferError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn read_frames(&mut self, timeout: Duration) -> Result<Option<Vec<i16>>> {
        if let Some(message) = self.take_stream_error() {
            return Err(ConferError::AudioCapture { message });
        }

        match self.frames_rx.recv_timeout(timeout) {
            Ok(frames) => Ok(Some(frames)),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Ok(None),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(ConferError::AudioCapture {
                    message: "audio stream disconnected".to_string(),
                })
            }
        }
    }
}
