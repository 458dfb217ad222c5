use crate::config::SessionSection;
use crate::defaults;
use crate::error::{RehearseError, Result};
use std::time::Duration;

/// Validated pacing parameters for one session. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pause_secs: u32,
    speed_factor: f32,
    question_count: usize,
    use_premium: bool,
}

impl SessionConfig {
    /// Validate and build a session configuration.
    ///
    /// Out-of-range values are rejected rather than clamped. The speed is
    /// snapped to the nearest 0.1 step after the bounds check.
    pub fn new(
        pause_secs: u32,
        speed_factor: f32,
        question_count: usize,
        use_premium: bool,
    ) -> Result<Self> {
        if !(defaults::MIN_PAUSE_SECS..=defaults::MAX_PAUSE_SECS).contains(&pause_secs) {
            return Err(RehearseError::out_of_range(
                "pause_secs",
                format!(
                    "{} is outside {}..={}",
                    pause_secs,
                    defaults::MIN_PAUSE_SECS,
                    defaults::MAX_PAUSE_SECS
                ),
            ));
        }

        let speed_factor = snap_speed(speed_factor);
        if !speed_factor.is_finite()
            || !(defaults::MIN_SPEED..=defaults::MAX_SPEED).contains(&speed_factor)
        {
            return Err(RehearseError::out_of_range(
                "speed",
                format!(
                    "{} is outside {}..={}",
                    speed_factor,
                    defaults::MIN_SPEED,
                    defaults::MAX_SPEED
                ),
            ));
        }

        if !(defaults::MIN_QUESTION_COUNT..=defaults::MAX_QUESTION_COUNT).contains(&question_count)
        {
            return Err(RehearseError::out_of_range(
                "question_count",
                format!(
                    "{} is outside {}..={}",
                    question_count,
                    defaults::MIN_QUESTION_COUNT,
                    defaults::MAX_QUESTION_COUNT
                ),
            ));
        }

        Ok(Self {
            pause_secs,
            speed_factor,
            question_count,
            use_premium,
        })
    }

    /// Build from the `[session]` config section.
    pub fn from_section(section: &SessionSection, use_premium: bool) -> Result<Self> {
        Self::new(
            section.pause_secs,
            section.speed,
            section.question_count,
            use_premium,
        )
    }

    pub fn pause_secs(&self) -> u32 {
        self.pause_secs
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs(u64::from(self.pause_secs))
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn use_premium(&self) -> bool {
        self.use_premium
    }

    /// Number of pairs a session over `total` pairs will narrate.
    pub fn effective_count(&self, total: usize) -> usize {
        self.question_count.min(total)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pause_secs: defaults::PAUSE_SECS,
            speed_factor: defaults::SPEED,
            question_count: defaults::QUESTION_COUNT,
            use_premium: false,
        }
    }
}

/// Round to the nearest speed step, so 1.27 becomes 1.3.
fn snap_speed(speed: f32) -> f32 {
    let steps = (speed / defaults::SPEED_STEP).round();
    // Round again at two decimals to drop float noise like 1.3000001
    ((steps * defaults::SPEED_STEP) * 100.0).round() / 100.0
}
