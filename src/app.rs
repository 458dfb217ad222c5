//! Rehearsal application entry points.
//!
//! Orchestrates the complete flow:
//! load document → extract pairs → detect environment → narrate

use crate::audio::playback::{AudioRenderer, ClientStreamRenderer, PlaybackAdapter};
use crate::cli::RunOptions;
use crate::command::{CommandExecutor, SystemCommandExecutor};
use crate::config::Config;
use crate::document::load_document;
use crate::environment::{RuntimeEnvironment, detect_environment};
use crate::error::{RehearseError, Result};
use crate::extract::{QaPair, extract_pairs};
use crate::output::TerminalObserver;
use crate::session::{CancelToken, NarrationSession, SessionConfig, SessionReport};
use crate::voice::espeak::EspeakVoice;
use crate::voice::{VoiceProvider, VoiceVariant, resolve_provider};
use std::path::Path;
use std::sync::Arc;

/// Run the rehearsal command: narrate the first pairs of a document.
///
/// # Arguments
/// * `config` - Base configuration (file + environment)
/// * `document` - Path to the document, or `-` for stdin
/// * `options` - Per-run CLI overrides
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level (0=default, 1=session details, 2=full diagnostics)
pub async fn run_session_command(
    mut config: Config,
    document: &Path,
    options: RunOptions,
    quiet: bool,
    verbosity: u8,
) -> Result<SessionReport> {
    apply_run_options(&mut config, options);

    // Validate before any slow work
    let session_config = SessionConfig::from_section(&config.session, config.voice.use_premium)?;

    let executor: Arc<dyn CommandExecutor> = Arc::new(SystemCommandExecutor);
    let pairs = load_pairs(document, executor.as_ref())?;
    if !quiet {
        eprintln!("Extracted {} Q&A pairs", pairs.len());
    }

    let env = detect_environment(&config);
    if verbosity >= 1 {
        eprintln!("Environment: {}", env);
    }

    let variant = resolve_provider(session_config.use_premium(), env.premium_available);
    if session_config.use_premium() && variant == VoiceVariant::Standard && !quiet {
        eprintln!("Premium voice unavailable (no API key or not compiled in), using standard voice.");
    }

    let standard = build_standard_voice(&config, executor);
    let playback = build_playback(&config)?;
    let mut session = match build_premium_voice(&config, variant) {
        Some(premium) => NarrationSession::new(
            premium,
            playback,
            env.playback_target,
            session_config,
        )
        .with_fallback(standard),
        None => NarrationSession::new(
            standard,
            playback,
            env.playback_target,
            session_config,
        ),
    };

    let cancel = CancelToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());
    session = session.with_cancel_token(cancel);

    log_plan(&env, &session_config, pairs.len());
    let observer = TerminalObserver::new(quiet, verbosity);
    let report = session.run(&pairs, &observer).await;

    interrupt.abort();
    report
}

/// Run the extract command: print the pairs found in a document.
pub fn run_extract_command(document: &Path, json: bool) -> Result<()> {
    let pairs = load_pairs(document, &SystemCommandExecutor)?;

    if json {
        let rendered = serde_json::to_string_pretty(&pairs)
            .map_err(|e| RehearseError::Other(format!("Failed to encode pairs: {}", e)))?;
        println!("{}", rendered);
    } else {
        for (i, pair) in pairs.iter().enumerate() {
            println!("Q{}: {}", i + 1, pair.question());
            println!("A{}: {}", i + 1, pair.answer());
            println!();
        }
        eprintln!("Extracted {} Q&A pairs", pairs.len());
    }
    Ok(())
}

/// Fold per-run CLI options into the loaded configuration.
pub fn apply_run_options(config: &mut Config, options: RunOptions) {
    if let Some(pause) = options.pause {
        config.session.pause_secs = pause;
    }
    if let Some(speed) = options.speed {
        config.session.speed = speed;
    }
    if let Some(count) = options.count {
        config.session.question_count = count;
    }
    if options.premium_voice {
        config.voice.use_premium = true;
    }
    if options.standard_voice {
        config.voice.use_premium = false;
    }
    if let Some(mode) = options.playback {
        config.playback.target = mode;
    }
    if let Some(dir) = options.export_dir {
        config.playback.export_dir = Some(dir);
    }
    if let Some(device) = options.device {
        config.playback.device = Some(device);
    }
}

/// Load a document and extract its pairs. No pairs is an error here.
fn load_pairs(document: &Path, executor: &dyn CommandExecutor) -> Result<Vec<QaPair>> {
    let text = load_document(document, executor)?;
    let pairs = extract_pairs(&text);
    if pairs.is_empty() {
        return Err(RehearseError::ExtractionEmpty);
    }
    Ok(pairs)
}

fn build_standard_voice(config: &Config, executor: Arc<dyn CommandExecutor>) -> Box<dyn VoiceProvider> {
    Box::new(
        EspeakVoice::new(executor)
            .with_binary(config.voice.espeak_binary.clone())
            .with_voice(config.voice.espeak_voice.clone()),
    )
}

/// The premium voice, when it was resolved and can be constructed.
#[cfg(feature = "premium-voice")]
fn build_premium_voice(config: &Config, variant: VoiceVariant) -> Option<Box<dyn VoiceProvider>> {
    use crate::voice::elevenlabs::{ElevenLabsConfig, ElevenLabsVoice};

    if variant != VoiceVariant::Premium {
        return None;
    }
    let api_key = config.voice.api_key()?;
    let mut premium = ElevenLabsConfig::new(api_key);
    premium.voice_id = config.voice.voice_id.clone();
    premium.model_id = config.voice.model_id.clone();
    premium.stability = config.voice.stability;

    match ElevenLabsVoice::new(premium) {
        Ok(voice) => Some(Box::new(voice)),
        Err(e) => {
            tracing::warn!("premium voice disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "premium-voice"))]
fn build_premium_voice(_config: &Config, _variant: VoiceVariant) -> Option<Box<dyn VoiceProvider>> {
    None
}

/// The client-stream renderer keeps clips only when an export directory is
/// configured.
fn build_playback(config: &Config) -> Result<PlaybackAdapter> {
    let client = match &config.playback.export_dir {
        Some(dir) => ClientStreamRenderer::new(dir.clone()),
        None => ClientStreamRenderer::scratch()?,
    };
    Ok(PlaybackAdapter::new(
        build_device_renderer(config),
        Box::new(client),
    ))
}

#[cfg(feature = "cpal-audio")]
fn build_device_renderer(config: &Config) -> Option<Box<dyn AudioRenderer>> {
    Some(Box::new(crate::audio::output::DevicePlayer::new(
        config.playback.device.clone(),
    )))
}

#[cfg(not(feature = "cpal-audio"))]
fn build_device_renderer(_config: &Config) -> Option<Box<dyn AudioRenderer>> {
    None
}

/// Cancel the session on Ctrl+C.
fn spawn_interrupt_handler(cancel: CancelToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(e) => tracing::warn!("Failed to wait for Ctrl+C: {}", e),
        }
    })
}

fn log_plan(env: &RuntimeEnvironment, config: &SessionConfig, available: usize) {
    tracing::info!(
        pause_secs = config.pause_secs(),
        speed = config.speed_factor(),
        count = config.effective_count(available),
        target = %env.playback_target,
        premium_available = env.premium_available,
        "session plan"
    );
}
