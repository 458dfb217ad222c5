//! Speech synthesis backends.

#[cfg(feature = "premium-voice")]
pub mod elevenlabs;
pub mod espeak;
pub mod provider;

pub use provider::{
    MockVoiceProvider, SynthesisError, VoiceProvider, VoiceRequest, VoiceVariant, resolve_provider,
};
