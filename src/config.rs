use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub response: ResponseConfig,
    pub ui: UiConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Microphone input device name (None = system default)
    pub mic_device: Option<String>,
    /// Speaker loopback/monitor device name (None = auto-detect)
    pub speaker_device: Option<String>,
    pub sample_rate: u32,
    /// Segment cadence per capture worker in milliseconds
    pub segment_ms: u32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub backend: SttBackend,
    /// Local Whisper model path or name
    pub model: String,
    pub language: String,
    pub api_base: String,
    pub api_model: String,
}

/// Transcription backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SttBackend {
    Local,
    Api,
}

/// Response generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResponseConfig {
    pub interval_secs: u64,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    pub api_base: String,
    pub model: String,
}

/// Presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Poll cadence for transcript/response refresh in milliseconds
    pub poll_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            mic_device: None,
            speaker_device: None,
            sample_rate: defaults::SAMPLE_RATE,
            segment_ms: defaults::SEGMENT_MS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            backend: SttBackend::Local,
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            api_base: defaults::API_BASE.to_string(),
            api_model: defaults::API_STT_MODEL.to_string(),
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::RESPONSE_INTERVAL_SECS,
            min_interval_secs: defaults::MIN_RESPONSE_INTERVAL_SECS,
            max_interval_secs: defaults::MAX_RESPONSE_INTERVAL_SECS,
            api_base: defaults::API_BASE.to_string(),
            model: defaults::API_RESPONSE_MODEL.to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            poll_ms: defaults::UI_POLL_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Default config file path (~/.config/confer/config.toml)
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confer")
            .join("config.toml")
    }

    #[cfg(not(feature = "cli"))]
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CONFER_MODEL → stt.model
    /// - CONFER_LANGUAGE → stt.language
    /// - CONFER_MIC_DEVICE → audio.mic_device
    /// - CONFER_SPEAKER_DEVICE → audio.speaker_device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("CONFER_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }
        if let Ok(language) = std::env::var("CONFER_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }
        if let Ok(device) = std::env::var("CONFER_MIC_DEVICE")
            && !device.is_empty()
        {
            self.audio.mic_device = Some(device);
        }
        if let Ok(device) = std::env::var("CONFER_SPEAKER_DEVICE")
            && !device.is_empty()
        {
            self.audio.speaker_device = Some(device);
        }
        self
    }

    /// Validate cross-field constraints.
    ///
    /// Interval bounds must be ordered and the segment cadence positive.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.response.min_interval_secs > self.response.max_interval_secs {
            return Err(crate::error::ConferError::ConfigInvalidValue {
                key: "response.min_interval_secs".to_string(),
                message: "must not exceed response.max_interval_secs".to_string(),
            });
        }
        if self.audio.segment_ms == 0 {
            return Err(crate::error::ConferError::ConfigInvalidValue {
                key: "audio.segment_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.ui.poll_ms == 0 {
            return Err(crate::error::ConferError::ConfigInvalidValue {
                key: "ui.poll_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Env var tests mutate process state; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.segment_ms, 3000);
        assert_eq!(config.stt.backend, SttBackend::Local);
        assert_eq!(config.stt.model, "base.en");
        assert_eq!(config.response.interval_secs, 2);
        assert_eq!(config.response.min_interval_secs, 1);
        assert_eq!(config.response.max_interval_secs, 10);
        assert_eq!(config.ui.poll_ms, 300);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[audio]
mic_device = "hw:1"
speaker_device = "alsa_output.monitor"
sample_rate = 48000
segment_ms = 2000

[stt]
backend = "api"
language = "de"

[response]
interval_secs = 5
model = "gpt-test"

[ui]
poll_ms = 100
"#
        )
        .expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.audio.mic_device.as_deref(), Some("hw:1"));
        assert_eq!(
            config.audio.speaker_device.as_deref(),
            Some("alsa_output.monitor")
        );
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.stt.backend, SttBackend::Api);
        assert_eq!(config.stt.language, "de");
        assert_eq!(config.response.interval_secs, 5);
        assert_eq!(config.response.model, "gpt-test");
        assert_eq!(config.ui.poll_ms, 100);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "[response]\ninterval_secs = 7\n").expect("write");

        let config = Config::load(file.path()).expect("load");
        assert_eq!(config.response.interval_secs, 7);
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.stt.backend, SttBackend::Local);
    }

    #[test]
    fn test_load_invalid_toml_fails() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "this is not = [valid toml").expect("write");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            Config::load_or_default(Path::new("/nonexistent/confer.toml")).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
        crate::sys::set_env("CONFER_MODEL", "small.en");
        crate::sys::set_env("CONFER_LANGUAGE", "fr");
        crate::sys::set_env("CONFER_SPEAKER_DEVICE", "monitor0");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.stt.model, "small.en");
        assert_eq!(config.stt.language, "fr");
        assert_eq!(config.audio.speaker_device.as_deref(), Some("monitor0"));

        crate::sys::set_env("CONFER_MODEL", "");
        crate::sys::set_env("CONFER_LANGUAGE", "");
        crate::sys::set_env("CONFER_SPEAKER_DEVICE", "");
    }

    #[test]
    fn test_empty_env_override_is_ignored() {
        let _guard = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
        crate::sys::set_env("CONFER_MODEL", "");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.stt.model, defaults::DEFAULT_MODEL);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_interval_bounds() {
        let mut config = Config::default();
        config.response.min_interval_secs = 20;
        config.response.max_interval_secs = 5;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_segment() {
        let mut config = Config::default();
        config.audio.segment_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_round_trips_through_toml() {
        let config = Config {
            stt: SttConfig {
                backend: SttBackend::Api,
                ..Default::default()
            },
            ..Default::default()
        };
        let serialized = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&serialized).expect("parse");
        assert_eq!(parsed.stt.backend, SttBackend::Api);
    }
}
