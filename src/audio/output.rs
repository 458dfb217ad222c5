//! Direct playback on the local output device using CPAL.

use crate::audio::clip::{AudioClip, PcmAudio};
use crate::audio::playback::{AudioRenderer, PlaybackError, RenderOutcome};
use crate::error::{RehearseError, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Extra time allowed past the clip duration before playback is abandoned.
const PLAYBACK_GRACE: Duration = Duration::from_secs(2);

/// How often the blocking wait checks for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// Suppresses the ALSA/JACK/PipeWire chatter CPAL triggers while probing
/// backends.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Quiet JACK/ALSA probing noise.
///
/// Call at startup, before the runtime spawns worker threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// List available audio output devices.
pub fn list_output_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.output_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| RehearseError::Other(format!(
        "Failed to enumerate output devices: {}",
        e
    )))?;

    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// Whether a default output device exists.
pub fn has_default_output_device() -> bool {
    with_suppressed_stderr(|| cpal::default_host().default_output_device().is_some())
}

fn find_output_device(device_name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Some(name) = device_name {
            let devices = host
                .output_devices()
                .map_err(|e| RehearseError::Other(format!("Failed to enumerate devices: {}", e)))?;
            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    return Ok(dev);
                }
            }
            return Err(RehearseError::AudioDeviceNotFound {
                device: name.to_string(),
            });
        }

        host.default_output_device()
            .ok_or_else(|| RehearseError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Plays clips on a local output device, blocking until each one finishes.
#[derive(Debug, Clone, Default)]
pub struct DevicePlayer {
    device_name: Option<String>,
}

impl DevicePlayer {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    /// Decode, open the device, and play synchronously.
    pub fn play_blocking(&self, clip: &AudioClip) -> Result<()> {
        let pcm = clip.decode()?;
        let device = find_output_device(self.device_name.as_deref())?;
        play_on_device(&device, &pcm)
    }
}

#[async_trait]
impl AudioRenderer for DevicePlayer {
    async fn render(&self, clip: &AudioClip, _name: &str) -> std::result::Result<RenderOutcome, PlaybackError> {
        let player = self.clone();
        let clip = clip.clone();
        tokio::task::spawn_blocking(move || player.play_blocking(&clip))
            .await
            .map_err(|e| PlaybackError::new(format!("playback task failed: {}", e)))?
            .map_err(|e| PlaybackError::new(e.to_string()))?;
        Ok(RenderOutcome::Played)
    }

    fn name(&self) -> &'static str {
        "device"
    }
}

/// Shared cursor over the samples being played.
struct PlaybackState {
    samples: Vec<i16>,
    position: usize,
}

fn play_on_device(device: &cpal::Device, pcm: &PcmAudio) -> Result<()> {
    use cpal::SampleFormat;

    let default_config = device.default_output_config().map_err(|e| {
        RehearseError::Other(format!("Failed to query default output config: {}", e))
    })?;
    let device_rate = default_config.sample_rate().0;
    let device_channels = default_config.channels() as usize;
    let stream_config: cpal::StreamConfig = default_config.clone().into();

    let mono = pcm.to_mono();
    let samples = resample(&mono, pcm.sample_rate, device_rate);
    let duration = Duration::from_secs_f64(samples.len() as f64 / device_rate.max(1) as f64);

    let state = Arc::new(Mutex::new(PlaybackState {
        samples,
        position: 0,
    }));
    let finished = Arc::new(AtomicBool::new(false));

    let err_callback = |err| {
        tracing::warn!("Audio output stream error: {}", err);
    };

    let stream = match default_config.sample_format() {
        SampleFormat::I16 => {
            let state = Arc::clone(&state);
            let finished = Arc::clone(&finished);
            device.build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, device_channels, &state, &finished, |s| s, 0);
                },
                err_callback,
                None,
            )
        }
        SampleFormat::F32 => {
            let state = Arc::clone(&state);
            let finished = Arc::clone(&finished);
            device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_frames(
                        data,
                        device_channels,
                        &state,
                        &finished,
                        |s| s as f32 / i16::MAX as f32,
                        0.0,
                    );
                },
                err_callback,
                None,
            )
        }
        fmt => {
            return Err(RehearseError::Other(format!(
                "Unsupported output sample format: {:?}",
                fmt
            )));
        }
    }
    .map_err(|e| RehearseError::Other(format!("Failed to build output stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| RehearseError::Other(format!("Failed to start playback: {}", e)))?;

    let deadline = Instant::now() + duration + PLAYBACK_GRACE;
    while !finished.load(Ordering::Acquire) {
        if Instant::now() >= deadline {
            return Err(RehearseError::Other(
                "Playback timed out waiting for the output device".to_string(),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    // Let the device drain its last buffer
    std::thread::sleep(POLL_INTERVAL * 5);
    drop(stream);
    Ok(())
}

/// Copy the next mono samples into every channel of each output frame,
/// padding with silence once the clip is exhausted.
fn fill_frames<T: Copy>(
    data: &mut [T],
    channels: usize,
    state: &Mutex<PlaybackState>,
    finished: &AtomicBool,
    convert: impl Fn(i16) -> T,
    silence: T,
) {
    let Ok(mut state) = state.lock() else {
        data.iter_mut().for_each(|s| *s = silence);
        return;
    };
    for frame in data.chunks_mut(channels.max(1)) {
        let value = match state.samples.get(state.position) {
            Some(&sample) => {
                state.position += 1;
                convert(sample)
            }
            None => silence,
        };
        frame.iter_mut().for_each(|s| *s = value);
    }
    if state.position >= state.samples.len() {
        finished.store(true, Ordering::Release);
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
