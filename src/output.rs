//! Terminal rendering for the presentation loop.
//!
//! The display is a plain periodic repaint: every poll tick the loop clears
//! the screen and reprints the transcript pane, the suggestion pane, and a
//! status line. No scheduling primitives live here — callers drive the cadence.

use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::time::Duration;

/// Clear the terminal and move the cursor home.
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

/// Clear the current terminal line.
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Repaint the full view.
pub fn render_view(transcript: &str, response: &str, frozen: bool, interval: Duration) {
    clear_screen();

    println!("{}", "── Transcript ──────────────────────────────".dimmed());
    if transcript.is_empty() {
        println!("{}", "(listening...)".dimmed());
    } else {
        println!("{}", transcript);
    }

    println!();
    println!("{}", "── Suggested response ──────────────────────".dimmed());
    if response.is_empty() {
        println!("{}", "(no suggestion yet)".dimmed());
    } else {
        println!("{}", response.cyan());
    }

    println!();
    println!("{}", status_line(frozen, interval));
    let _ = io::stdout().flush();
}

/// One-line status with the command hints.
pub fn status_line(frozen: bool, interval: Duration) -> String {
    let freeze_state = if frozen { "FROZEN" } else { "live" };
    format!(
        "[{}] interval: {}s — commands: f freeze, c clear, i <secs> interval, q quit",
        freeze_state,
        interval.as_secs_f64()
    )
}
