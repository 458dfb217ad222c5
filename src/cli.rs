//! Command-line interface for rehearse
//!
//! Provides argument parsing using clap derive macros.

use crate::config::PlaybackMode;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Narrated interview rehearsal from Q&A documents
#[derive(Parser, Debug)]
#[command(
    name = "rehearse",
    version,
    about = "Narrated interview rehearsal from Q&A documents"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: session details, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default tracing filter for the verbosity flags. `RUST_LOG` wins over this.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "rehearse=info,warn",
            _ => "rehearse=debug,info",
        }
    }
}

/// Per-run overrides for the `[session]`, `[voice]` and `[playback]` config.
#[derive(clap::Args, Debug, Default, Clone, PartialEq)]
pub struct RunOptions {
    /// Thinking time between question and answer (5s-20s). Examples: 10, 15s
    #[arg(long, short = 'p', value_name = "DURATION", value_parser = parse_pause_secs)]
    pub pause: Option<u32>,

    /// Narration speed multiplier (0.8-1.5, step 0.1)
    #[arg(long, short = 's', value_name = "FACTOR")]
    pub speed: Option<f32>,

    /// Number of questions to rehearse (3-15)
    #[arg(long, short = 'n', value_name = "N")]
    pub count: Option<usize>,

    /// Use the premium voice when an API key is configured
    #[arg(long, conflicts_with = "standard_voice")]
    pub premium_voice: bool,

    /// Force the standard voice even if premium is configured
    #[arg(long)]
    pub standard_voice: bool,

    /// Where audio goes (auto, device, client)
    #[arg(long, value_name = "TARGET", value_parser = parse_playback)]
    pub playback: Option<PlaybackMode>,

    /// Keep client-stream audio files in this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Audio output device name (see `rehearse devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,
}

/// Parse a pause duration string into whole seconds.
///
/// Accepts bare numbers (seconds) and anything `humantime` understands (`15s`).
fn parse_pause_secs(s: &str) -> Result<u32, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u32>() {
        return Ok(secs);
    }
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    if duration.subsec_nanos() != 0 {
        return Err(format!("pause must be a whole number of seconds, got {}", s));
    }
    u32::try_from(duration.as_secs()).map_err(|e| e.to_string())
}

fn parse_playback(s: &str) -> Result<PlaybackMode, String> {
    s.parse().map_err(|e: crate::error::RehearseError| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a narrated rehearsal session over a document
    Run {
        /// Document with Q:/A: lines (.txt, .md, .pdf, or - for stdin)
        document: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Print the Q&A pairs found in a document
    Extract {
        /// Document with Q:/A: lines (.txt, .md, .pdf, or - for stdin)
        document: PathBuf,

        /// Print pairs as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available audio output devices
    Devices,

    /// Check system dependencies
    Check,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment) as TOML
    Show,
    /// Print the configuration file path
    Path,
}
