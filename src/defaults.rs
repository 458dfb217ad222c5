//! Default configuration constants for rehearse.
//!
//! Shared by the config file, the CLI and session validation so that every
//! surface agrees on the same bounds.

/// Default thinking time between a spoken question and its answer, in seconds.
pub const PAUSE_SECS: u32 = 10;

/// Shortest allowed thinking time in seconds.
pub const MIN_PAUSE_SECS: u32 = 5;

/// Longest allowed thinking time in seconds.
pub const MAX_PAUSE_SECS: u32 = 20;

/// Default narration speed multiplier (1.0 = natural speed).
pub const SPEED: f32 = 1.0;

/// Slowest allowed narration speed.
pub const MIN_SPEED: f32 = 0.8;

/// Fastest allowed narration speed.
pub const MAX_SPEED: f32 = 1.5;

/// Granularity of the speed setting.
pub const SPEED_STEP: f32 = 0.1;

/// Default number of questions per session.
pub const QUESTION_COUNT: usize = 5;

/// Fewest questions a session may be configured for.
pub const MIN_QUESTION_COUNT: usize = 3;

/// Most questions a session may be configured for, regardless of pool size.
pub const MAX_QUESTION_COUNT: usize = 15;

/// Length of one countdown tick in milliseconds.
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Marker that opens a question line.
pub const QUESTION_MARKER: &str = "Q:";

/// Marker that opens (or continues) an answer line.
pub const ANSWER_MARKER: &str = "A:";

/// Executable used for standard speech synthesis.
pub const ESPEAK_BINARY: &str = "espeak-ng";

/// espeak-ng voice used for standard synthesis.
pub const ESPEAK_VOICE: &str = "en";

/// Executable used to pull text out of PDF documents.
pub const PDFTOTEXT_BINARY: &str = "pdftotext";

/// Base URL of the premium voice service.
pub const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1";

/// Premium voice id ("Rachel").
pub const ELEVENLABS_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Premium synthesis model.
pub const ELEVENLABS_MODEL_ID: &str = "eleven_multilingual_v2";

/// Premium voice stability setting.
pub const ELEVENLABS_STABILITY: f32 = 0.5;

/// Raw PCM output format requested from the premium service.
pub const ELEVENLABS_OUTPUT_FORMAT: &str = "pcm_22050";

/// Sample rate matching [`ELEVENLABS_OUTPUT_FORMAT`].
pub const ELEVENLABS_SAMPLE_RATE: u32 = 22050;

/// Speed hint range accepted by the premium service.
pub const ELEVENLABS_MIN_SPEED: f32 = 0.7;
pub const ELEVENLABS_MAX_SPEED: f32 = 1.2;

/// Request timeout for the premium voice service, in seconds.
pub const ELEVENLABS_TIMEOUT_SECS: u64 = 60;

/// Prefix of the per-session temporary directory that receives
/// client-stream clips when no export directory is configured.
pub const EXPORT_DIR_PREFIX: &str = "rehearse-audio-";

/// Environment flag that marks a host without direct audio-device access.
pub const CLIENT_STREAM_ENV: &str = "REHEARSE_CLIENT_STREAM";
