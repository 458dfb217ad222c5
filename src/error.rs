//! Error types for rehearse.

use crate::audio::playback::PlaybackError;
use crate::voice::provider::SynthesisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RehearseError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigOutOfRange { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Document errors
    #[error("Failed to read document {path}: {message}")]
    DocumentRead { path: String, message: String },

    #[error("No readable text found. Try a text-based PDF (not scanned images).")]
    DocumentEmpty,

    #[error("No Q&A pairs found. Make sure the document uses 'Q:' and 'A:' labels.")]
    ExtractionEmpty,

    // External tool errors
    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    // Narration errors
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Audio decoding failed: {message}")]
    AudioDecode { message: String },

    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl RehearseError {
    /// Shorthand for a `ConfigOutOfRange` error.
    pub fn out_of_range(key: &str, message: impl Into<String>) -> Self {
        Self::ConfigOutOfRange {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RehearseError>;
