//! Standard voice: local `espeak-ng` synthesis followed by speed adjustment.
//!
//! espeak-ng renders at its neutral rate into a scoped temporary WAV file;
//! the file is removed when the handle drops, whichever way synthesis exits.
//! Speed is applied afterwards by [`adjust_speed`].

use crate::audio::clip::AudioClip;
use crate::audio::tempo::adjust_speed;
use crate::command::CommandExecutor;
use crate::defaults;
use crate::error::RehearseError;
use crate::voice::provider::{SynthesisError, VoiceProvider, VoiceRequest, VoiceVariant};
use async_trait::async_trait;
use std::sync::Arc;

/// Standard voice backed by espeak-ng.
pub struct EspeakVoice {
    executor: Arc<dyn CommandExecutor>,
    binary: String,
    voice: String,
}

impl EspeakVoice {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            binary: defaults::ESPEAK_BINARY.to_string(),
            voice: defaults::ESPEAK_VOICE.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Render `text` at neutral speed and return the WAV bytes.
    fn render_neutral(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let temp = tempfile::Builder::new()
            .prefix("rehearse-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| SynthesisError::new(format!("cannot create temp file: {}", e)))?;
        let path = temp.path().to_string_lossy().into_owned();
        tracing::debug!(path = %path, "espeak-ng temp file");

        // A leading dash would be read as an option
        let text = if text.starts_with('-') {
            format!(" {}", text)
        } else {
            text.to_string()
        };

        self.executor
            .execute(&self.binary, &["-v", &self.voice, "-w", &path, &text])
            .map_err(|e| match e {
                RehearseError::ToolNotFound { tool } => SynthesisError::new(format!(
                    "{} not installed. Install it with: sudo apt install espeak-ng",
                    tool
                )),
                other => SynthesisError::new(other.to_string()),
            })?;

        std::fs::read(temp.path())
            .map_err(|e| SynthesisError::new(format!("cannot read synthesized audio: {}", e)))
    }
}

#[async_trait]
impl VoiceProvider for EspeakVoice {
    async fn synthesize(&self, request: &VoiceRequest) -> Result<AudioClip, SynthesisError> {
        let text = request.utterance_text.trim();
        if text.is_empty() {
            return Err(SynthesisError::new("nothing to say"));
        }

        let executor = Arc::clone(&self.executor);
        let voice = EspeakVoice {
            executor,
            binary: self.binary.clone(),
            voice: self.voice.clone(),
        };
        let text = text.to_string();
        let speed = request.speed_factor;

        tokio::task::spawn_blocking(move || {
            let wav = voice.render_neutral(&text)?;
            if wav.is_empty() {
                return Err(SynthesisError::new("espeak-ng produced no audio"));
            }
            adjust_speed(&AudioClip::wav(wav), speed).map_err(|e| SynthesisError::new(e.to_string()))
        })
        .await
        .map_err(|e| SynthesisError::new(format!("synthesis task failed: {}", e)))?
    }

    fn variant(&self) -> VoiceVariant {
        VoiceVariant::Standard
    }

    fn name(&self) -> &str {
        "espeak-ng"
    }
}
