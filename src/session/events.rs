use crate::audio::playback::PlaybackTarget;
use crate::voice::VoiceVariant;
use std::path::PathBuf;
use std::sync::Mutex;

/// Everything a session reports to its display boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        total: usize,
        variant: VoiceVariant,
        target: PlaybackTarget,
    },
    /// `index` is 1-based.
    Question {
        index: usize,
        total: usize,
        text: String,
    },
    Countdown {
        remaining: u32,
    },
    Answer {
        index: usize,
        text: String,
    },
    /// A clip was handed to the client side instead of played.
    AudioDelivered {
        path: PathBuf,
    },
    Progress {
        percent: u8,
    },
    /// Recoverable problem; the session carries on.
    Warning {
        message: String,
    },
    Completed {
        count: usize,
    },
    Cancelled {
        completed: usize,
    },
}

/// Receives session events as they happen.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

/// Observer that records every event, for tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct CollectorObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl CollectorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Warning { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Progress { percent } => Some(percent),
                _ => None,
            })
            .collect()
    }
}

impl SessionObserver for CollectorObserver {
    fn on_event(&self, event: &SessionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

impl<T: SessionObserver> SessionObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &SessionEvent) {
        (**self).on_event(event)
    }
}

/// Overall progress after `done` of `total` pairs, rounded to a whole percent.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (done.min(total) as f64 / total as f64 * 100.0).round();
    percent as u8
}
