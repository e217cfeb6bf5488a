//! Command-line interface for confer
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Live conversation assistant for the desktop
#[derive(Parser, Debug)]
#[command(name = "confer", version, about = "Live conversation assistant for the desktop")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: worker events, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use the hosted transcription API instead of the local model
    #[arg(long)]
    pub api: bool,

    /// Whisper model for the local backend (default: base.en)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for transcription (e.g. en, de, auto)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Microphone input device name
    #[arg(long, value_name = "DEVICE")]
    pub mic_device: Option<String>,

    /// Speaker loopback/monitor device name
    #[arg(long, value_name = "DEVICE")]
    pub speaker_device: Option<String>,

    /// Starting response refresh interval (1-10s). Examples: 2s, 5s, 1500ms
    #[arg(long, short = 'i', value_name = "DURATION", value_parser = parse_interval)]
    pub interval: Option<Duration>,
}

/// Parse an interval string into a Duration.
///
/// Supports any format accepted by `humantime` plus bare numbers (seconds).
fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Check system dependencies
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
