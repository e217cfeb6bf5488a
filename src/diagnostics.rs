//! System diagnostics and dependency checking.
//!
//! Verifies that required system tools are installed and configured correctly.

use crate::defaults;
use crate::error::{Result, ConferError};
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Verify the audio-conversion tool is present before any worker starts.
///
/// ffmpeg handles the format conversions the transcription backends rely on;
/// without it the pipeline must not start at all.
pub fn require_converter() -> Result<()> {
    match check_command("ffmpeg") {
        CheckResult::Ok | CheckResult::Warning(_) => Ok(()),
        CheckResult::NotFound => Err(ConferError::StartupDependencyMissing {
            tool: "ffmpeg".to_string(),
            hint: "Install ffmpeg and try again.".to_string(),
        }),
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies() {
    println!("Checking system dependencies...\n");

    print!("ffmpeg (audio conversion): ");
    match check_command("ffmpeg") {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install ffmpeg:");
            println!("    sudo apt install ffmpeg   (Debian/Ubuntu)");
            println!("    sudo pacman -S ffmpeg     (Arch)");
            println!("    brew install ffmpeg       (macOS)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {}", msg),
    }

    print!("API key ({}): ", defaults::API_KEY_ENV);
    match std::env::var(defaults::API_KEY_ENV) {
        Ok(key) if !key.is_empty() => println!("✓ set"),
        _ => {
            println!("- not set");
            println!("  Needed for --api transcription and response suggestions.");
        }
    }

    #[cfg(feature = "cpal-audio")]
    {
        print!("audio input devices: ");
        match crate::audio::capture::list_devices() {
            Ok(devices) if !devices.is_empty() => {
                println!("✓ {} found", devices.len());
                for device in devices {
                    println!("    {}", device);
                }
            }
            Ok(_) => println!("✗ none found"),
            Err(e) => println!("⚠ WARNING: {}", e),
        }
    }

    #[cfg(not(feature = "cpal-audio"))]
    println!("audio input devices: - skipped (built without cpal-audio)");
}
