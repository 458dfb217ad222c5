//! Cancellable thinking-time countdown.

use crate::defaults;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shared cancellation flag, checked at every suspension point of a session.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as this token, so the wait cannot fail
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Finished,
    Cancelled,
}

/// Counts down a number of discrete ticks, reporting the remaining count
/// before each one.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    tick: Duration,
}

impl Countdown {
    /// Countdown with a custom tick length. Tests use a zero or tiny tick.
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Wait `ticks` ticks. `on_tick` receives `ticks, ticks - 1, ..., 1`.
    pub async fn run(
        &self,
        ticks: u32,
        cancel: &CancelToken,
        mut on_tick: impl FnMut(u32),
    ) -> CountdownOutcome {
        for remaining in (1..=ticks).rev() {
            if cancel.is_cancelled() {
                return CountdownOutcome::Cancelled;
            }
            on_tick(remaining);
            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {}
                _ = cancel.cancelled() => return CountdownOutcome::Cancelled,
            }
        }
        if cancel.is_cancelled() {
            CountdownOutcome::Cancelled
        } else {
            CountdownOutcome::Finished
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(Duration::from_millis(defaults::COUNTDOWN_TICK_MS))
    }
}
