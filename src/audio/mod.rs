//! Audio handles, speed adjustment and playback.

pub mod clip;
#[cfg(feature = "cpal-audio")]
pub mod output;
pub mod playback;
pub mod tempo;
