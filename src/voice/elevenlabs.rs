//! Premium voice: ElevenLabs text-to-speech over HTTP.
//!
//! The service takes the narration speed as a request hint, so no local
//! speed adjustment is applied. Audio comes back as raw 16-bit PCM.

use crate::audio::clip::{AudioClip, AudioFormat};
use crate::defaults;
use crate::voice::provider::{SynthesisError, VoiceProvider, VoiceRequest, VoiceVariant};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Settings for the premium voice.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    pub api_key: String,
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: defaults::ELEVENLABS_API_URL.to_string(),
            api_key: api_key.into(),
            voice_id: defaults::ELEVENLABS_VOICE_ID.to_string(),
            model_id: defaults::ELEVENLABS_MODEL_ID.to_string(),
            stability: defaults::ELEVENLABS_STABILITY,
        }
    }
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    speed: f32,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Clamp the narration speed into the range the service accepts.
pub fn speed_hint(factor: f32) -> f32 {
    if factor.is_nan() {
        return 1.0;
    }
    factor.clamp(defaults::ELEVENLABS_MIN_SPEED, defaults::ELEVENLABS_MAX_SPEED)
}

/// Premium voice backed by the ElevenLabs API.
pub struct ElevenLabsVoice {
    config: ElevenLabsConfig,
    client: reqwest::Client,
}

impl ElevenLabsVoice {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, SynthesisError> {
        if config.api_key.trim().is_empty() {
            return Err(SynthesisError::new("ElevenLabs API key is not configured"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::ELEVENLABS_TIMEOUT_SECS))
            .build()
            .map_err(|e| SynthesisError::new(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/text-to-speech/{}?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id,
            defaults::ELEVENLABS_OUTPUT_FORMAT
        )
    }
}

#[async_trait]
impl VoiceProvider for ElevenLabsVoice {
    async fn synthesize(&self, request: &VoiceRequest) -> Result<AudioClip, SynthesisError> {
        let text = request.utterance_text.trim();
        if text.is_empty() {
            return Err(SynthesisError::new("nothing to say"));
        }

        let body = SpeechBody {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                speed: speed_hint(request.speed_factor),
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::new(format!("ElevenLabs request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SynthesisError::new(format!(
                "ElevenLabs error {}: {}",
                status,
                detail.trim()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::new(format!("ElevenLabs response truncated: {}", e)))?;
        if bytes.is_empty() {
            return Err(SynthesisError::new("ElevenLabs returned no audio"));
        }

        Ok(AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: defaults::ELEVENLABS_SAMPLE_RATE,
                channels: 1,
            },
            bytes.to_vec(),
        ))
    }

    fn variant(&self) -> VoiceVariant {
        VoiceVariant::Premium
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_hint_is_clamped_to_service_range() {
        assert_eq!(speed_hint(1.5), 1.2);
        assert_eq!(speed_hint(0.5), 0.7);
        assert_eq!(speed_hint(1.1), 1.1);
        assert_eq!(speed_hint(f32::NAN), 1.0);
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = ElevenLabsVoice::new(ElevenLabsConfig::new("  ")).err().unwrap();
        assert!(err.cause.contains("API key"));
    }

    #[test]
    fn endpoint_includes_voice_and_format() {
        let mut config = ElevenLabsConfig::new("key");
        config.base_url = "https://example.test/v1/".to_string();
        config.voice_id = "voice123".to_string();
        let voice = ElevenLabsVoice::new(config).unwrap();

        assert_eq!(
            voice.endpoint(),
            "https://example.test/v1/text-to-speech/voice123?output_format=pcm_22050"
        );
    }

    #[test]
    fn request_body_shape() {
        let body = SpeechBody {
            text: "Question 1. Why?",
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings {
                stability: 0.5,
                speed: 1.0,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["text"], "Question 1. Why?");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
        assert_eq!(json["voice_settings"]["speed"], 1.0);
    }

    #[tokio::test]
    async fn unreachable_service_fails_soft() {
        let mut config = ElevenLabsConfig::new("key");
        config.base_url = "http://127.0.0.1:9".to_string();
        let voice = ElevenLabsVoice::new(config).unwrap();
        let request = VoiceRequest::new("Hello", 1.0, VoiceVariant::Premium);

        let err = voice.synthesize(&request).await.unwrap_err();

        assert!(err.cause.contains("ElevenLabs request failed"));
    }
}
