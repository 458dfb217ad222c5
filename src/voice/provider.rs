use crate::audio::clip::AudioClip;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

/// Synthesis failed (credential, network, encoding). The caller skips the
/// utterance's audio and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Speech synthesis failed: {cause}")]
pub struct SynthesisError {
    pub cause: String,
}

impl SynthesisError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Which speech backend produces the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceVariant {
    /// Local synthesis at neutral speed plus a separate speed adjustment.
    Standard,
    /// Remote high-quality synthesis that takes the speed as a request hint.
    Premium,
}

impl std::fmt::Display for VoiceVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

/// One utterance to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRequest {
    pub utterance_text: String,
    pub speed_factor: f32,
    pub voice_variant: VoiceVariant,
}

impl VoiceRequest {
    pub fn new(text: impl Into<String>, speed_factor: f32, voice_variant: VoiceVariant) -> Self {
        Self {
            utterance_text: text.into(),
            speed_factor,
            voice_variant,
        }
    }
}

/// Trait for text-to-speech backends.
///
/// This trait allows swapping implementations (espeak-ng, ElevenLabs, mock).
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Synthesize the request's text at its speed factor.
    async fn synthesize(&self, request: &VoiceRequest) -> Result<AudioClip, SynthesisError>;

    /// Which variant this provider implements.
    fn variant(&self) -> VoiceVariant;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Pick the variant for a session. Premium is only chosen when it was both
/// requested and detected as available; anything else falls back to Standard.
pub fn resolve_provider(prefer_premium: bool, premium_available: bool) -> VoiceVariant {
    if prefer_premium && premium_available {
        VoiceVariant::Premium
    } else {
        VoiceVariant::Standard
    }
}

/// Mock voice provider for testing
#[derive(Debug)]
pub struct MockVoiceProvider {
    variant: VoiceVariant,
    clip: AudioClip,
    fail_on: HashSet<usize>,
    fail_always: bool,
    requests: Mutex<Vec<VoiceRequest>>,
}

impl MockVoiceProvider {
    /// Create a new mock provider returning a tiny WAV clip
    pub fn new(variant: VoiceVariant) -> Self {
        Self {
            variant,
            clip: AudioClip::wav(SILENT_WAV.to_vec()),
            fail_on: HashSet::new(),
            fail_always: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to return a specific clip
    pub fn with_clip(mut self, clip: AudioClip) -> Self {
        self.clip = clip;
        self
    }

    /// Fail the n-th call (0-based)
    pub fn with_failure_on_call(mut self, call: usize) -> Self {
        self.fail_on.insert(call);
        self
    }

    /// Fail every call
    pub fn with_failure(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<VoiceRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VoiceProvider for MockVoiceProvider {
    async fn synthesize(&self, request: &VoiceRequest) -> Result<AudioClip, SynthesisError> {
        let call = match self.requests.lock() {
            Ok(mut requests) => {
                requests.push(request.clone());
                requests.len() - 1
            }
            Err(_) => return Err(SynthesisError::new("mock state poisoned")),
        };

        if self.fail_always || self.fail_on.contains(&call) {
            return Err(SynthesisError::new("mock synthesis failure"));
        }
        Ok(self.clip.clone())
    }

    fn variant(&self) -> VoiceVariant {
        self.variant
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Implement VoiceProvider for Arc<T> so tests can keep a handle on a mock.
#[async_trait]
impl<T: VoiceProvider> VoiceProvider for std::sync::Arc<T> {
    async fn synthesize(&self, request: &VoiceRequest) -> Result<AudioClip, SynthesisError> {
        (**self).synthesize(request).await
    }

    fn variant(&self) -> VoiceVariant {
        (**self).variant()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 16 kHz mono 16-bit WAV holding two silent samples.
const SILENT_WAV: [u8; 48] = [
    b'R', b'I', b'F', b'F', 40, 0, 0, 0, b'W', b'A', b'V', b'E', b'f', b'm', b't', b' ', 16, 0, 0,
    0, 1, 0, 1, 0, 0x80, 0x3e, 0, 0, 0, 0x7d, 0, 0, 2, 0, 16, 0, b'd', b'a', b't', b'a', 4, 0, 0,
    0, 0, 0, 0, 0,
];
