//! Environment-adaptive audio rendering.
//!
//! A session resolves its [`PlaybackTarget`] once. `DirectDevice` plays
//! through the local output device and blocks until the clip finishes;
//! `ClientStream` hands the clip to the client side (written out as a file)
//! and returns immediately. Unless a directory is given, those files live in
//! a temporary directory owned by the renderer and go away with it.

use crate::audio::clip::AudioClip;
use crate::defaults;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Rendering failed (device, codec or delivery). Never fatal to a session.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Audio playback failed: {cause}")]
pub struct PlaybackError {
    pub cause: String,
}

impl PlaybackError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// Where narration audio goes for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTarget {
    DirectDevice,
    ClientStream,
}

impl std::fmt::Display for PlaybackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectDevice => write!(f, "audio device"),
            Self::ClientStream => write!(f, "client stream"),
        }
    }
}

/// What happened to a rendered clip.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Played to completion on the local device.
    Played,
    /// Delivered for client-side playback at this location.
    Delivered(PathBuf),
}

/// Trait for audio sinks.
///
/// This trait allows swapping implementations (real device vs file delivery vs mock).
#[async_trait]
pub trait AudioRenderer: Send + Sync {
    /// Render one clip. `name` identifies the utterance (e.g. `003-answer`).
    async fn render(&self, clip: &AudioClip, name: &str) -> Result<RenderOutcome, PlaybackError>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str;
}

/// Dispatches clips to the renderer matching the session's target.
pub struct PlaybackAdapter {
    device: Option<Box<dyn AudioRenderer>>,
    client: Box<dyn AudioRenderer>,
}

impl PlaybackAdapter {
    /// `device` is `None` when no direct-device backend is compiled in.
    pub fn new(device: Option<Box<dyn AudioRenderer>>, client: Box<dyn AudioRenderer>) -> Self {
        Self { device, client }
    }

    pub async fn render(
        &self,
        clip: &AudioClip,
        target: PlaybackTarget,
        name: &str,
    ) -> Result<RenderOutcome, PlaybackError> {
        if clip.is_empty() {
            return Err(PlaybackError::new("empty audio clip"));
        }
        let renderer = match target {
            PlaybackTarget::DirectDevice => self
                .device
                .as_deref()
                .ok_or_else(|| PlaybackError::new("no audio device backend available"))?,
            PlaybackTarget::ClientStream => self.client.as_ref(),
        };
        tracing::debug!(renderer = renderer.name(), name, "rendering clip");
        renderer.render(clip, name).await
    }
}

/// Delivers clips as WAV files in a directory for client-side playback.
pub struct ClientStreamRenderer {
    dir: PathBuf,
    // Removes the directory on drop
    _scratch: Option<tempfile::TempDir>,
}

impl ClientStreamRenderer {
    /// Write clips into `dir` and leave them there.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            _scratch: None,
        }
    }

    /// Write clips into a fresh temporary directory that is deleted when
    /// the renderer is dropped.
    pub fn scratch() -> crate::error::Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(defaults::EXPORT_DIR_PREFIX)
            .tempdir()?;
        tracing::debug!(dir = %scratch.path().display(), "client-stream scratch directory");
        Ok(Self {
            dir: scratch.path().to_path_buf(),
            _scratch: Some(scratch),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl AudioRenderer for ClientStreamRenderer {
    async fn render(&self, clip: &AudioClip, name: &str) -> Result<RenderOutcome, PlaybackError> {
        let wav = clip
            .clone()
            .into_wav()
            .map_err(|e| PlaybackError::new(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PlaybackError::new(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(format!("{}.wav", name));
        tokio::fs::write(&path, wav.data())
            .await
            .map_err(|e| PlaybackError::new(format!("cannot write {}: {}", path.display(), e)))?;

        Ok(RenderOutcome::Delivered(path))
    }

    fn name(&self) -> &'static str {
        "client-stream"
    }
}

/// Mock renderer for testing
#[derive(Debug, Default)]
pub struct MockRenderer {
    rendered: Mutex<Vec<String>>,
    fail_on: Vec<String>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail when rendering a clip whose name contains `pattern`.
    pub fn with_failure_on(mut self, pattern: &str) -> Self {
        self.fail_on.push(pattern.to_string());
        self
    }

    /// Names of clips rendered so far, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AudioRenderer for MockRenderer {
    async fn render(&self, _clip: &AudioClip, name: &str) -> Result<RenderOutcome, PlaybackError> {
        if self.fail_on.iter().any(|p| name.contains(p.as_str())) {
            return Err(PlaybackError::new(format!("mock playback failure for {}", name)));
        }
        if let Ok(mut names) = self.rendered.lock() {
            names.push(name.to_string());
        }
        Ok(RenderOutcome::Played)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Let a shared renderer (e.g. `Arc<MockRenderer>` kept by a test) plug into
/// the adapter.
#[async_trait]
impl<T: AudioRenderer> AudioRenderer for std::sync::Arc<T> {
    async fn render(&self, clip: &AudioClip, name: &str) -> Result<RenderOutcome, PlaybackError> {
        (**self).render(clip, name).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clip::{AudioFormat, PcmAudio};
    use std::sync::Arc;

    fn clip() -> AudioClip {
        PcmAudio::new(vec![0, 100, -100, 0], 16000, 1)
            .to_wav_clip()
            .unwrap()
    }

    #[tokio::test]
    async fn client_stream_writes_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ClientStreamRenderer::new(dir.path().join("audio"));

        let outcome = renderer.render(&clip(), "001-question").await.unwrap();

        let expected = dir.path().join("audio").join("001-question.wav");
        assert_eq!(outcome, RenderOutcome::Delivered(expected.clone()));
        let written = std::fs::read(expected).unwrap();
        assert_eq!(AudioClip::wav(written).decode().unwrap().samples, vec![0, 100, -100, 0]);
    }

    #[tokio::test]
    async fn scratch_directory_is_removed_on_drop() {
        let renderer = ClientStreamRenderer::scratch().unwrap();
        let dir = renderer.dir().to_path_buf();

        let outcome = renderer.render(&clip(), "001-answer").await.unwrap();
        assert_eq!(outcome, RenderOutcome::Delivered(dir.join("001-answer.wav")));
        assert!(dir.join("001-answer.wav").exists());

        drop(renderer);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn explicit_directory_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ClientStreamRenderer::new(dir.path());

        renderer.render(&clip(), "001-question").await.unwrap();
        drop(renderer);

        assert!(dir.path().join("001-question.wav").exists());
    }

    #[tokio::test]
    async fn client_stream_converts_raw_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ClientStreamRenderer::new(dir.path());
        let raw = AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: 22050,
                channels: 1,
            },
            vec![0x05, 0x00],
        );

        renderer.render(&raw, "002-answer").await.unwrap();

        let written = std::fs::read(dir.path().join("002-answer.wav")).unwrap();
        assert_eq!(AudioClip::wav(written).decode().unwrap().samples, vec![5]);
    }

    #[tokio::test]
    async fn adapter_routes_by_target() {
        let device = Arc::new(MockRenderer::new());
        let client = Arc::new(MockRenderer::new());
        let adapter = PlaybackAdapter::new(Some(Box::new(device.clone())), Box::new(client.clone()));

        adapter
            .render(&clip(), PlaybackTarget::DirectDevice, "001-question")
            .await
            .unwrap();
        adapter
            .render(&clip(), PlaybackTarget::ClientStream, "001-answer")
            .await
            .unwrap();

        assert_eq!(device.rendered(), vec!["001-question"]);
        assert_eq!(client.rendered(), vec!["001-answer"]);
    }

    #[tokio::test]
    async fn adapter_without_device_backend_fails_soft() {
        let adapter = PlaybackAdapter::new(None, Box::new(MockRenderer::new()));
        let err = adapter
            .render(&clip(), PlaybackTarget::DirectDevice, "001-question")
            .await
            .unwrap_err();
        assert!(err.cause.contains("no audio device"));
    }

    #[tokio::test]
    async fn adapter_rejects_empty_clip() {
        let adapter = PlaybackAdapter::new(None, Box::new(MockRenderer::new()));
        let empty = AudioClip::wav(Vec::new());
        assert!(
            adapter
                .render(&empty, PlaybackTarget::ClientStream, "x")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn mock_renderer_fails_on_pattern() {
        let renderer = MockRenderer::new().with_failure_on("002");
        assert!(renderer.render(&clip(), "001-question").await.is_ok());
        assert!(renderer.render(&clip(), "002-question").await.is_err());
        assert_eq!(renderer.rendered(), vec!["001-question"]);
    }

    #[test]
    fn target_display() {
        assert_eq!(PlaybackTarget::DirectDevice.to_string(), "audio device");
        assert_eq!(PlaybackTarget::ClientStream.to_string(), "client stream");
    }
}
