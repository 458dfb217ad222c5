//! Narrated rehearsal session.
//!
//! For each pair in order: announce and speak the question, count down the
//! thinking time, then announce and speak the answer. Synthesis and playback
//! failures are reported as warnings and never end the session. Only an
//! empty pair list does, before anything is spoken.

use crate::audio::clip::AudioClip;
use crate::audio::playback::{PlaybackAdapter, PlaybackTarget, RenderOutcome};
use crate::error::{RehearseError, Result};
use crate::extract::QaPair;
use crate::session::countdown::{CancelToken, Countdown, CountdownOutcome};
use crate::session::events::{SessionEvent, SessionObserver, progress_percent};
use crate::session::settings::SessionConfig;
use crate::voice::{VoiceProvider, VoiceRequest, VoiceVariant};
use std::future::Future;
use std::path::PathBuf;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Narrating the pair at this 0-based index.
    Running(usize),
    Completed,
    Cancelled,
}

/// Summary of a finished (or cancelled) session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub state: SessionState,
    /// Pairs narrated through to their answer.
    pub narrated: usize,
    /// Pairs the session set out to narrate.
    pub planned: usize,
    pub warnings: Vec<String>,
    /// Clips handed to the client side, in order.
    pub delivered: Vec<PathBuf>,
}

/// Which half of a pair an utterance belongs to.
#[derive(Debug, Clone, Copy)]
enum Part {
    Question,
    Answer,
}

impl Part {
    fn utterance(self, index: usize, text: &str) -> String {
        match self {
            Part::Question => format!("Question {}. {}", index, text),
            Part::Answer => format!("Answer. {}", text),
        }
    }

    fn clip_name(self, index: usize) -> String {
        match self {
            Part::Question => format!("{:03}-question", index),
            Part::Answer => format!("{:03}-answer", index),
        }
    }
}

/// Drives one rehearsal over an ordered list of pairs.
pub struct NarrationSession {
    voice: Box<dyn VoiceProvider>,
    fallback: Option<Box<dyn VoiceProvider>>,
    playback: PlaybackAdapter,
    target: PlaybackTarget,
    config: SessionConfig,
    countdown: Countdown,
    cancel: CancelToken,
    state: SessionState,
}

impl NarrationSession {
    pub fn new(
        voice: Box<dyn VoiceProvider>,
        playback: PlaybackAdapter,
        target: PlaybackTarget,
        config: SessionConfig,
    ) -> Self {
        Self {
            voice,
            fallback: None,
            playback,
            target,
            config,
            countdown: Countdown::default(),
            cancel: CancelToken::new(),
            state: SessionState::Idle,
        }
    }

    /// Provider used for an utterance when the main one fails.
    pub fn with_fallback(mut self, fallback: Box<dyn VoiceProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn variant(&self) -> VoiceVariant {
        self.voice.variant()
    }

    /// Narrate the first `min(question_count, pairs.len())` pairs.
    pub async fn run(
        &mut self,
        pairs: &[QaPair],
        observer: &dyn SessionObserver,
    ) -> Result<SessionReport> {
        if pairs.is_empty() {
            return Err(RehearseError::ExtractionEmpty);
        }

        let planned = self.config.effective_count(pairs.len());
        let mut report = SessionReport {
            state: SessionState::Idle,
            narrated: 0,
            planned,
            warnings: Vec::new(),
            delivered: Vec::new(),
        };

        tracing::info!(
            planned,
            available = pairs.len(),
            voice = self.voice.name(),
            target = %self.target,
            "session starting"
        );
        observer.on_event(&SessionEvent::Started {
            total: planned,
            variant: self.voice.variant(),
            target: self.target,
        });

        for (i, pair) in pairs.iter().take(planned).enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(report, observer));
            }
            self.state = SessionState::Running(i);
            let number = i + 1;

            observer.on_event(&SessionEvent::Question {
                index: number,
                total: planned,
                text: pair.question().to_string(),
            });
            self.narrate(Part::Question, number, pair.question(), observer, &mut report)
                .await;
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(report, observer));
            }

            let outcome = self
                .countdown
                .run(self.config.pause_secs(), &self.cancel, |remaining| {
                    observer.on_event(&SessionEvent::Countdown { remaining })
                })
                .await;
            if outcome == CountdownOutcome::Cancelled {
                return Ok(self.cancelled(report, observer));
            }

            observer.on_event(&SessionEvent::Answer {
                index: number,
                text: pair.answer().to_string(),
            });
            self.narrate(Part::Answer, number, pair.answer(), observer, &mut report)
                .await;
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled(report, observer));
            }

            report.narrated = number;
            observer.on_event(&SessionEvent::Progress {
                percent: progress_percent(number, planned),
            });
        }

        self.state = SessionState::Completed;
        report.state = SessionState::Completed;
        tracing::info!(
            narrated = report.narrated,
            warnings = report.warnings.len(),
            "session completed"
        );
        observer.on_event(&SessionEvent::Completed {
            count: report.narrated,
        });
        Ok(report)
    }

    fn cancelled(&mut self, mut report: SessionReport, observer: &dyn SessionObserver) -> SessionReport {
        self.state = SessionState::Cancelled;
        report.state = SessionState::Cancelled;
        tracing::info!(narrated = report.narrated, "session cancelled");
        observer.on_event(&SessionEvent::Cancelled {
            completed: report.narrated,
        });
        report
    }

    /// Speak one utterance. Every failure ends up as a warning.
    async fn narrate(
        &self,
        part: Part,
        index: usize,
        text: &str,
        observer: &dyn SessionObserver,
        report: &mut SessionReport,
    ) {
        let name = part.clip_name(index);
        let utterance = part.utterance(index, text);

        let Some(clip) = self.synthesize(&utterance, &name, observer, report).await else {
            return;
        };

        let rendered = match self
            .until_cancelled(self.playback.render(&clip, self.target, &name))
            .await
        {
            Some(rendered) => rendered,
            None => return,
        };

        match rendered {
            Ok(RenderOutcome::Played) => tracing::debug!(name, "played"),
            Ok(RenderOutcome::Delivered(path)) => {
                tracing::debug!(name, path = %path.display(), "delivered");
                observer.on_event(&SessionEvent::AudioDelivered { path: path.clone() });
                report.delivered.push(path);
            }
            Err(e) => warn(observer, report, format!("No audio for {}: {}", name, e)),
        }
    }

    /// Synthesize with the main voice, retrying once on the fallback when
    /// the main voice fails.
    async fn synthesize(
        &self,
        utterance: &str,
        name: &str,
        observer: &dyn SessionObserver,
        report: &mut SessionReport,
    ) -> Option<AudioClip> {
        let request = VoiceRequest::new(utterance, self.config.speed_factor(), self.voice.variant());
        let first = self.until_cancelled(self.voice.synthesize(&request)).await?;

        let err = match first {
            Ok(clip) => return Some(clip),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            warn(observer, report, format!("No audio for {}: {}", name, err));
            return None;
        };

        warn(
            observer,
            report,
            format!(
                "{} voice failed for {} ({}); using {} voice",
                self.voice.variant(),
                name,
                err.cause,
                fallback.variant()
            ),
        );
        let request = VoiceRequest::new(utterance, self.config.speed_factor(), fallback.variant());
        match self.until_cancelled(fallback.synthesize(&request)).await? {
            Ok(clip) => Some(clip),
            Err(e) => {
                warn(observer, report, format!("No audio for {}: {}", name, e));
                None
            }
        }
    }

    /// Run `fut` unless the session is cancelled first.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            output = fut => Some(output),
            _ = self.cancel.cancelled() => None,
        }
    }
}

fn warn(observer: &dyn SessionObserver, report: &mut SessionReport, message: String) {
    // The observer is the user-facing channel for these
    tracing::debug!("{}", message);
    observer.on_event(&SessionEvent::Warning {
        message: message.clone(),
    });
    report.warnings.push(message);
}
