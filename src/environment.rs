//! Runtime environment detection.
//!
//! Decides once, at session start, where audio goes and whether the premium
//! voice can be used. The result is immutable for the rest of the session.

use crate::audio::playback::PlaybackTarget;
use crate::config::{Config, PlaybackMode};
use crate::defaults;

/// What the session can do on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    pub playback_target: PlaybackTarget,
    pub premium_available: bool,
}

impl std::fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "playback: {}, premium voice: {}",
            self.playback_target,
            if self.premium_available {
                "available"
            } else {
                "unavailable"
            }
        )
    }
}

/// Detect the runtime environment from configuration and process state.
pub fn detect_environment(config: &Config) -> RuntimeEnvironment {
    let client_flag = client_stream_flag();
    let device_backend = cfg!(feature = "cpal-audio");
    let playback_target = resolve_target(config.playback.target, client_flag, device_backend);
    let premium_available = premium_available(
        cfg!(feature = "premium-voice"),
        config.voice.api_key().is_some(),
    );

    let env = RuntimeEnvironment {
        playback_target,
        premium_available,
    };
    tracing::debug!(
        client_flag,
        device_backend,
        mode = ?config.playback.target,
        "detected {}",
        env
    );
    env
}

/// Whether the hosting process asked for client-side playback.
fn client_stream_flag() -> bool {
    std::env::var(defaults::CLIENT_STREAM_ENV)
        .map(|v| {
            let v = v.trim().to_lowercase();
            !v.is_empty() && v != "0" && v != "false"
        })
        .unwrap_or(false)
}

/// Pick the playback target.
///
/// | Mode   | Client flag | Device backend | Target        |
/// |--------|-------------|----------------|---------------|
/// | device | any         | any            | DirectDevice  |
/// | client | any         | any            | ClientStream  |
/// | auto   | set         | any            | ClientStream  |
/// | auto   | unset       | missing        | ClientStream  |
/// | auto   | unset       | present        | DirectDevice  |
pub fn resolve_target(mode: PlaybackMode, client_flag: bool, device_backend: bool) -> PlaybackTarget {
    match mode {
        PlaybackMode::Device => PlaybackTarget::DirectDevice,
        PlaybackMode::Client => PlaybackTarget::ClientStream,
        PlaybackMode::Auto if client_flag || !device_backend => PlaybackTarget::ClientStream,
        PlaybackMode::Auto => PlaybackTarget::DirectDevice,
    }
}

/// Premium needs both the compiled-in backend and a credential.
pub fn premium_available(backend_compiled: bool, has_api_key: bool) -> bool {
    backend_compiled && has_api_key
}
