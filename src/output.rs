//! Terminal rendering of session events.
//!
//! Question and answer text go to stdout. Countdown, progress and status
//! lines go to stderr so piping the transcript stays clean.

use crate::session::{SessionEvent, SessionObserver};
use std::io::{self, Write};

const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

const PROGRESS_WIDTH: usize = 20;

/// Clear the current terminal line (replaces the countdown)
pub fn clear_line() {
    eprint!("\r\x1b[2K");
}

/// Render a fixed-width bar like `[#####---------------]  25%`.
pub fn format_progress(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = (usize::from(percent) * PROGRESS_WIDTH + 50) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        percent
    )
}

pub fn format_countdown(remaining: u32) -> String {
    if remaining == 1 {
        "Time left: 1 second".to_string()
    } else {
        format!("Time left: {} seconds", remaining)
    }
}

/// Prints session events to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalObserver {
    quiet: bool,
    verbosity: u8,
}

impl TerminalObserver {
    pub fn new(quiet: bool, verbosity: u8) -> Self {
        Self { quiet, verbosity }
    }
}

impl SessionObserver for TerminalObserver {
    fn on_event(&self, event: &SessionEvent) {
        render_event(event, self.quiet, self.verbosity);
    }
}

/// Render a single session event.
pub fn render_event(event: &SessionEvent, quiet: bool, verbosity: u8) {
    match event {
        SessionEvent::Started {
            total,
            variant,
            target,
        } => {
            if !quiet {
                eprintln!("{DIM}Rehearsing {total} questions ({variant} voice, {target}){RESET}");
            }
        }
        SessionEvent::Question { index, total, text } => {
            clear_line();
            println!();
            println!("{BOLD}Question {index}/{total}:{RESET} {text}");
        }
        SessionEvent::Countdown { remaining } => {
            if !quiet {
                eprint!("\r\x1b[2K{DIM}{}{RESET}", format_countdown(*remaining));
                io::stderr().flush().ok();
            }
        }
        SessionEvent::Answer { text, .. } => {
            clear_line();
            println!("{GREEN}Answer:{RESET} {text}");
        }
        SessionEvent::AudioDelivered { path } => {
            if verbosity >= 1 {
                eprintln!("{DIM}audio: {}{RESET}", path.display());
            }
        }
        SessionEvent::Progress { percent } => {
            if !quiet {
                eprintln!("{DIM}{}{RESET}", format_progress(*percent));
            }
        }
        SessionEvent::Warning { message } => {
            clear_line();
            eprintln!("{YELLOW}Warning: {message}{RESET}");
        }
        SessionEvent::Completed { count } => {
            clear_line();
            eprintln!();
            eprintln!("{GREEN}Interview Simulation Completed! ({count} questions){RESET}");
        }
        SessionEvent::Cancelled { completed } => {
            clear_line();
            eprintln!();
            eprintln!("{YELLOW}Session cancelled after {completed} questions{RESET}");
        }
    }
}
