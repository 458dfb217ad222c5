//! Speed adjustment for synthesized speech.
//!
//! Changes tempo without changing pitch using waveform-similarity
//! overlap-add (WSOLA): fixed-size Hann-windowed frames are taken from the
//! input at `factor` times the output hop, each nudged within a small
//! tolerance to line up with the previous frame's natural continuation.

use crate::audio::clip::{AudioClip, PcmAudio};
use crate::defaults::{MAX_SPEED, MIN_SPEED};
use crate::error::Result;

/// Frame length in milliseconds.
const FRAME_MS: u32 = 40;

/// Search tolerance around the nominal analysis position, in milliseconds.
const TOLERANCE_MS: u32 = 5;

/// Stride used when scoring candidate alignments.
const CORRELATION_STRIDE: usize = 4;

/// Factors this close to 1.0 leave the audio untouched.
const IDENTITY_EPSILON: f32 = 1e-3;

/// Clamp a speed factor into the supported range. NaN falls back to 1.0.
pub fn clamp_speed(factor: f32) -> f32 {
    if factor.is_nan() {
        return 1.0;
    }
    factor.clamp(MIN_SPEED, MAX_SPEED)
}

/// Re-time a clip by `factor` (>1.0 is faster). Multi-channel input is
/// mixed down to mono. Returns a WAV clip.
pub fn adjust_speed(clip: &AudioClip, factor: f32) -> Result<AudioClip> {
    let factor = clamp_speed(factor);
    let pcm = clip.decode()?;

    if (factor - 1.0).abs() < IDENTITY_EPSILON && pcm.channels == 1 {
        return clip.clone().into_wav();
    }

    let mono = pcm.to_mono();
    let stretched = time_stretch(&mono, pcm.sample_rate, factor);
    PcmAudio::new(stretched, pcm.sample_rate, 1).to_wav_clip()
}

/// Time-stretch mono samples. Output length is roughly `len / factor`.
pub fn time_stretch(samples: &[i16], sample_rate: u32, factor: f32) -> Vec<i16> {
    let factor = clamp_speed(factor);
    if samples.is_empty() || (factor - 1.0).abs() < IDENTITY_EPSILON {
        return samples.to_vec();
    }

    let frame_len = ((sample_rate * FRAME_MS / 1000) as usize).max(4);
    if samples.len() <= frame_len {
        return samples.to_vec();
    }

    let synthesis_hop = frame_len / 2;
    let tolerance = (sample_rate * TOLERANCE_MS / 1000) as usize;
    let window = hann_window(frame_len);
    let target_len = (samples.len() as f64 / factor as f64).round() as usize;

    let mut output = vec![0.0f32; target_len + frame_len];
    let mut norm = vec![0.0f32; target_len + frame_len];
    let input: Vec<f32> = samples.iter().map(|&s| s as f32).collect();

    // Position in the input that naturally follows the previous frame
    let mut continuation: Option<usize> = None;
    let mut frame_index = 0usize;

    loop {
        let out_pos = frame_index * synthesis_hop;
        if out_pos >= target_len {
            break;
        }
        let nominal = (out_pos as f64 * factor as f64).round() as usize;
        if nominal >= input.len() {
            break;
        }

        let start = match continuation {
            Some(natural) => best_alignment(&input, natural, nominal, tolerance, synthesis_hop),
            None => nominal,
        };

        for (i, &w) in window.iter().enumerate() {
            let Some(&sample) = input.get(start + i) else {
                break;
            };
            output[out_pos + i] += sample * w;
            norm[out_pos + i] += w;
        }

        continuation = Some(start + synthesis_hop);
        frame_index += 1;
    }

    output
        .iter()
        .zip(norm.iter())
        .take(target_len)
        .map(|(&value, &weight)| {
            let value = if weight > 1e-3 { value / weight } else { value };
            value.clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// Pick the start within `nominal ± tolerance` whose opening segment best
/// matches the segment starting at `natural`.
fn best_alignment(
    input: &[f32],
    natural: usize,
    nominal: usize,
    tolerance: usize,
    overlap: usize,
) -> usize {
    if natural + overlap > input.len() {
        return nominal;
    }
    let reference = &input[natural..natural + overlap];

    let lo = nominal.saturating_sub(tolerance);
    let hi = (nominal + tolerance).min(input.len().saturating_sub(overlap));

    let mut best = nominal.min(hi);
    let mut best_score = f32::MIN;
    for candidate in lo..=hi {
        let segment = &input[candidate..candidate + overlap];
        let score: f32 = reference
            .iter()
            .zip(segment)
            .step_by(CORRELATION_STRIDE)
            .map(|(a, b)| a * b)
            .sum();
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / len as f32;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::clip::AudioFormat;

    fn sine(sample_rate: u32, secs: f32, freq: f32) -> Vec<i16> {
        let n = (sample_rate as f32 * secs) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                ((2.0 * std::f32::consts::PI * freq * t).sin() * 8000.0) as i16
            })
            .collect()
    }

    #[test]
    fn clamp_speed_bounds() {
        assert_eq!(clamp_speed(0.5), 0.8);
        assert_eq!(clamp_speed(3.0), 1.5);
        assert_eq!(clamp_speed(1.2), 1.2);
        assert_eq!(clamp_speed(f32::NAN), 1.0);
    }

    #[test]
    fn faster_speed_shortens_audio() {
        let input = sine(16000, 1.0, 220.0);
        let output = time_stretch(&input, 16000, 1.5);
        let expected = (input.len() as f32 / 1.5).round() as usize;
        assert_eq!(output.len(), expected);
    }

    #[test]
    fn slower_speed_lengthens_audio() {
        let input = sine(16000, 1.0, 220.0);
        let output = time_stretch(&input, 16000, 0.8);
        assert_eq!(output.len(), (input.len() as f32 / 0.8).round() as usize);
    }

    #[test]
    fn out_of_range_factor_is_clamped() {
        let input = sine(16000, 0.5, 220.0);
        let too_fast = time_stretch(&input, 16000, 4.0);
        let max_fast = time_stretch(&input, 16000, 1.5);
        assert_eq!(too_fast.len(), max_fast.len());
    }

    #[test]
    fn unit_speed_is_identity() {
        let input = sine(16000, 0.25, 440.0);
        assert_eq!(time_stretch(&input, 16000, 1.0), input);
    }

    #[test]
    fn stretched_sine_keeps_its_energy() {
        let input = sine(16000, 1.0, 200.0);
        let output = time_stretch(&input, 16000, 1.3);

        let rms = |s: &[i16]| {
            let sum: f64 = s.iter().map(|&v| (v as f64) * (v as f64)).sum();
            (sum / s.len() as f64).sqrt()
        };
        let ratio = rms(&output) / rms(&input);
        assert!(ratio > 0.7 && ratio < 1.3, "rms ratio {}", ratio);
    }

    #[test]
    fn short_input_passes_through() {
        let input = vec![1i16, 2, 3];
        assert_eq!(time_stretch(&input, 16000, 1.5), input);
        assert!(time_stretch(&[], 16000, 1.5).is_empty());
    }

    #[test]
    fn adjust_speed_returns_wav() {
        let pcm = PcmAudio::new(sine(22050, 0.5, 300.0), 22050, 1);
        let clip = pcm.to_wav_clip().unwrap();

        let faster = adjust_speed(&clip, 1.25).unwrap();

        assert_eq!(faster.format(), AudioFormat::Wav);
        let decoded = faster.decode().unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert!(decoded.samples.len() < pcm.samples.len());
    }

    #[test]
    fn adjust_speed_converts_raw_pcm() {
        let samples = sine(22050, 0.2, 300.0);
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let clip = AudioClip::new(
            AudioFormat::Pcm16 {
                sample_rate: 22050,
                channels: 1,
            },
            bytes,
        );

        let same = adjust_speed(&clip, 1.0).unwrap();

        assert_eq!(same.format(), AudioFormat::Wav);
        assert_eq!(same.decode().unwrap().samples, samples);
    }
}
