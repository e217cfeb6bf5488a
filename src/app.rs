//! Conversation assistant entry point.
//!
//! Orchestrates the complete flow: capture both streams → transcribe →
//! suggest responses → poll shared state for display.

use crate::audio::capture::CpalSource;
use crate::audio::source::AudioSource;
use crate::cli::Cli;
use crate::config::{Config, SttBackend};
use crate::defaults;
use crate::diagnostics;
use crate::error::{Result, ConferError};
use crate::output;
use crate::pipeline::orchestrator::{Assistant, AssistantConfig};
use crate::respond::api::{ApiResponseConfig, ApiResponseEngine};
use crate::respond::engine::ResponseEngine;
use crate::stt::api::{ApiTranscriptionConfig, ApiTranscriptionEngine};
use crate::stt::engine::TranscriptionEngine;
use crate::stt::whisper::{WhisperConfig, WhisperEngine};
use crate::sys;
use crossbeam_channel::{Receiver, unbounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Operator commands read from stdin.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    ToggleFreeze,
    Clear,
    SetInterval(Duration),
    Quit,
}

/// Parse one stdin line into a command.
fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.trim().split_whitespace();
    match parts.next()? {
        "f" | "freeze" => Some(Command::ToggleFreeze),
        "c" | "clear" => Some(Command::Clear),
        "q" | "quit" | "exit" => Some(Command::Quit),
        "i" | "interval" => {
            let value = parts.next()?;
            let duration = value
                .parse::<u64>()
                .map(Duration::from_secs)
                .or_else(|_| humantime::parse_duration(value))
                .ok()?;
            Some(Command::SetInterval(duration))
        }
        _ => None,
    }
}

/// Spawn the stdin reader thread feeding operator commands.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) => break, // EOF
                Ok(_) => {
                    if let Some(command) = parse_command(&line)
                        && tx.send(command).is_err()
                    {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

/// Resolve a model name or path to the model file location.
///
/// Absolute/relative paths are used as-is; bare names map to the cache
/// directory (~/.cache/confer/models/ggml-{name}.bin).
fn model_path(model: &str) -> PathBuf {
    let as_path = PathBuf::from(model);
    if model.contains('/') || as_path.exists() {
        return as_path;
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("confer")
        .join("models")
        .join(format!("ggml-{}.bin", model))
}

fn api_key() -> String {
    std::env::var(defaults::API_KEY_ENV).unwrap_or_default()
}

/// Build the transcription engine selected by config and the --api flag.
fn build_stt_engine(config: &Config, force_api: bool) -> Result<Arc<dyn TranscriptionEngine>> {
    let use_api = force_api || config.stt.backend == SttBackend::Api;

    if use_api {
        let engine = ApiTranscriptionEngine::new(ApiTranscriptionConfig {
            api_base: config.stt.api_base.clone(),
            api_key: api_key(),
            model: config.stt.api_model.clone(),
            language: config.stt.language.clone(),
            ..Default::default()
        })?;
        Ok(Arc::new(engine))
    } else {
        let engine = WhisperEngine::new(WhisperConfig {
            model_path: model_path(&config.stt.model),
            language: config.stt.language.clone(),
            threads: None,
        })?;
        Ok(Arc::new(engine))
    }
}

/// Build the response engine.
fn build_response_engine(config: &Config) -> Result<Arc<dyn ResponseEngine>> {
    let engine = ApiResponseEngine::new(ApiResponseConfig {
        api_base: config.response.api_base.clone(),
        api_key: api_key(),
        model: config.response.model.clone(),
        ..Default::default()
    })?;
    Ok(Arc::new(engine))
}

/// Run the assistant until the operator quits.
///
/// Startup order matters: the converter precondition is checked before any
/// worker starts, and the mic opens before the speaker loopback so the audio
/// host initializes once on a predictable device.
pub fn run(mut config: Config, cli: &Cli) -> Result<()> {
    sys::suppress_audio_warnings();
    diagnostics::require_converter()?;

    // CLI overrides on top of file + env configuration.
    if let Some(model) = &cli.model {
        config.stt.model = model.clone();
    }
    if let Some(language) = &cli.language {
        config.stt.language = language.clone();
    }
    if let Some(device) = &cli.mic_device {
        config.audio.mic_device = Some(device.clone());
    }
    if let Some(device) = &cli.speaker_device {
        config.audio.speaker_device = Some(device.clone());
    }
    config.validate()?;

    let stt_engine = build_stt_engine(&config, cli.api)?;
    let response_engine = build_response_engine(&config)?;

    let mic: Box<dyn AudioSource> = Box::new(CpalSource::mic(config.audio.mic_device.as_deref())?);
    let speaker: Box<dyn AudioSource> =
        Box::new(CpalSource::speaker(config.audio.speaker_device.as_deref())?);

    let assistant_config = AssistantConfig {
        segment_ms: config.audio.segment_ms,
        response_interval: cli
            .interval
            .unwrap_or(Duration::from_secs(config.response.interval_secs)),
        min_response_interval: Duration::from_secs(config.response.min_interval_secs),
        max_response_interval: Duration::from_secs(config.response.max_interval_secs),
        poll_quantum: Duration::from_millis(defaults::POLL_QUANTUM_MS),
    };

    let assistant = Assistant::new(assistant_config).start(
        mic,
        speaker,
        stt_engine,
        response_engine,
    );

    let commands = spawn_command_reader();
    let poll = Duration::from_millis(config.ui.poll_ms);

    println!("READY");

    loop {
        // Drain any operator commands that arrived since the last tick.
        let mut quit = false;
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::ToggleFreeze => {
                    assistant.toggle_freeze();
                }
                Command::Clear => {
                    assistant.clear();
                }
                Command::SetInterval(interval) => {
                    assistant.set_update_interval(interval);
                }
                Command::Quit => quit = true,
            }
        }
        if quit {
            break;
        }

        if !cli.quiet {
            output::render_view(
                &assistant.transcript_text(),
                &assistant.latest_response(),
                assistant.is_frozen(),
                assistant.update_interval(),
            );
        }

        std::thread::sleep(poll);
    }

    assistant.stop();
    Ok(())
}

/// List available audio input devices.
pub fn list_audio_devices() -> Result<()> {
    let devices = crate::audio::capture::list_devices()?;

    if devices.is_empty() {
        return Err(ConferError::AudioDeviceNotFound {
            device: "any input".to_string(),
        });
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}
