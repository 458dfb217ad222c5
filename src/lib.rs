//! rehearse - Narrated interview rehearsal
//!
//! Extracts question/answer pairs from a document and plays them back as a
//! timed session: question, thinking pause, answer.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod document;
pub mod environment;
pub mod error;
pub mod extract;
pub mod output;
pub mod session;
pub mod voice;

// Composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Core traits (voice → playback)
pub use audio::playback::{AudioRenderer, PlaybackAdapter, PlaybackTarget};
pub use command::{CommandExecutor, SystemCommandExecutor};
pub use voice::{VoiceProvider, VoiceRequest, VoiceVariant, resolve_provider};

// Extraction
pub use extract::{QaPair, extract_pairs};

// Session
pub use session::{NarrationSession, SessionConfig, SessionEvent, SessionObserver, SessionReport};

// Error handling
pub use error::{RehearseError, Result};

// Config
pub use config::Config;
pub use environment::{RuntimeEnvironment, detect_environment};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
