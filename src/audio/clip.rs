//! Opaque audio handles passed from voice providers to playback.

use crate::error::{RehearseError, Result};
use std::io::Cursor;
use std::time::Duration;

/// Encoding of the bytes inside an [`AudioClip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF/WAV container.
    Wav,
    /// Raw little-endian signed 16-bit PCM.
    Pcm16 { sample_rate: u32, channels: u16 },
}

impl AudioFormat {
    /// File extension used when a clip is written out.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Pcm16 { .. } => "pcm",
        }
    }
}

/// Synthesized audio: bytes plus a format tag.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    format: AudioFormat,
    data: Vec<u8>,
}

impl AudioClip {
    pub fn new(format: AudioFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }

    pub fn wav(data: Vec<u8>) -> Self {
        Self::new(AudioFormat::Wav, data)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode into interleaved 16-bit samples.
    pub fn decode(&self) -> Result<PcmAudio> {
        match self.format {
            AudioFormat::Wav => decode_wav(&self.data),
            AudioFormat::Pcm16 {
                sample_rate,
                channels,
            } => {
                if self.data.len() % 2 != 0 {
                    return Err(RehearseError::AudioDecode {
                        message: format!("odd PCM byte count {}", self.data.len()),
                    });
                }
                let samples = self
                    .data
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                Ok(PcmAudio::new(samples, sample_rate, channels))
            }
        }
    }

    /// Re-encode as a WAV clip (no-op for WAV input).
    pub fn into_wav(self) -> Result<AudioClip> {
        match self.format {
            AudioFormat::Wav => Ok(self),
            AudioFormat::Pcm16 { .. } => self.decode()?.to_wav_clip(),
        }
    }
}

/// Decoded interleaved 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Average all channels down to mono.
    pub fn to_mono(&self) -> Vec<i16> {
        if self.channels == 1 {
            return self.samples.clone();
        }
        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    /// Encode as a 16-bit WAV clip.
    pub fn to_wav_clip(&self) -> Result<AudioClip> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).map_err(|e| RehearseError::AudioDecode {
                    message: format!("Failed to start WAV encoding: {}", e),
                })?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| RehearseError::AudioDecode {
                        message: format!("Failed to encode WAV sample: {}", e),
                    })?;
            }
            writer.finalize().map_err(|e| RehearseError::AudioDecode {
                message: format!("Failed to finalize WAV: {}", e),
            })?;
        }
        Ok(AudioClip::wav(cursor.into_inner()))
    }
}

fn decode_wav(data: &[u8]) -> Result<PcmAudio> {
    let mut reader =
        hound::WavReader::new(Cursor::new(data)).map_err(|e| RehearseError::AudioDecode {
            message: format!("Failed to parse WAV data: {}", e),
        })?;
    let spec = reader.spec();

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        (hound::SampleFormat::Int, bits) if bits <= 32 => {
            let shift = bits.saturating_sub(16) as u32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
        (hound::SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<std::result::Result<Vec<_>, _>>(),
        (_, bits) => {
            return Err(RehearseError::AudioDecode {
                message: format!("Unsupported WAV bit depth: {}", bits),
            });
        }
    }
    .map_err(|e| RehearseError::AudioDecode {
        message: format!("Failed to read WAV samples: {}", e),
    })?;

    Ok(PcmAudio::new(samples, spec.sample_rate, spec.channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        PcmAudio::new(samples.to_vec(), sample_rate, channels)
            .to_wav_clip()
            .unwrap()
            .data()
            .to_vec()
    }

    #[test]
    fn wav_clip_decodes_to_original_samples() {
        let samples = vec![100i16, -200, 300, -400, 500];
        let clip = AudioClip::wav(make_wav_data(22050, 1, &samples));

        let pcm = clip.decode().unwrap();

        assert_eq!(pcm.samples, samples);
        assert_eq!(pcm.sample_rate, 22050);
        assert_eq!(pcm.channels, 1);
    }

    #[test]
    fn raw_pcm_is_little_endian() {
        let clip = AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: 22050,
                channels: 1,
            },
            vec![0x01, 0x00, 0xff, 0xff],
        );

        let pcm = clip.decode().unwrap();

        assert_eq!(pcm.samples, vec![1, -1]);
    }

    #[test]
    fn odd_pcm_length_is_rejected() {
        let clip = AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: 22050,
                channels: 1,
            },
            vec![0x01, 0x00, 0xff],
        );
        assert!(clip.decode().is_err());
    }

    #[test]
    fn garbage_is_not_wav() {
        let clip = AudioClip::wav(b"definitely not audio".to_vec());
        assert!(matches!(
            clip.decode(),
            Err(RehearseError::AudioDecode { .. })
        ));
    }

    #[test]
    fn pcm_converts_into_wav() {
        let clip = AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: 16000,
                channels: 1,
            },
            vec![0x10, 0x00, 0x20, 0x00],
        );

        let wav = clip.into_wav().unwrap();

        assert_eq!(wav.format(), AudioFormat::Wav);
        assert_eq!(wav.decode().unwrap().samples, vec![16, 32]);
    }

    #[test]
    fn stereo_downmix_averages_channels() {
        let pcm = PcmAudio::new(vec![100, 200, 300, 400], 16000, 2);
        assert_eq!(pcm.to_mono(), vec![150, 350]);
        assert_eq!(pcm.frames(), 2);
    }

    #[test]
    fn duration_from_frames() {
        let pcm = PcmAudio::new(vec![0; 16000], 16000, 1);
        assert_eq!(pcm.duration(), Duration::from_secs(1));
    }
}
