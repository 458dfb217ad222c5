//! Timed narration sessions over extracted pairs.

pub mod countdown;
pub mod events;
pub mod narration;
pub mod settings;

pub use countdown::{CancelToken, Countdown, CountdownOutcome};
pub use events::{CollectorObserver, SessionEvent, SessionObserver, progress_percent};
pub use narration::{NarrationSession, SessionReport, SessionState};
pub use settings::SessionConfig;
