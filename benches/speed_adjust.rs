use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rehearse::audio::clip::PcmAudio;
use rehearse::audio::tempo::{adjust_speed, time_stretch};
use std::hint::black_box;

/// A voiced-like signal: a 180 Hz tone with a 4 Hz amplitude envelope.
fn speech_like(sample_rate: u32, secs: u32) -> Vec<i16> {
    (0..sample_rate * secs)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let carrier = (t * 180.0 * std::f32::consts::TAU).sin();
            let envelope = 0.5 + 0.5 * (t * 4.0 * std::f32::consts::TAU).sin();
            (carrier * envelope * 8000.0) as i16
        })
        .collect()
}

fn bench_time_stretch(c: &mut Criterion) {
    let samples = speech_like(22050, 5);
    let mut group = c.benchmark_group("time_stretch");
    for factor in [0.8f32, 1.2, 1.5] {
        group.bench_with_input(BenchmarkId::from_parameter(factor), &factor, |b, &factor| {
            b.iter(|| time_stretch(black_box(&samples), 22050, factor))
        });
    }
    group.finish();
}

fn bench_adjust_speed_clip(c: &mut Criterion) {
    let clip = match PcmAudio::new(speech_like(22050, 5), 22050, 1).to_wav_clip() {
        Ok(clip) => clip,
        Err(e) => panic!("failed to build benchmark clip: {}", e),
    };
    c.bench_function("adjust_speed_wav_1.3x", |b| {
        b.iter(|| adjust_speed(black_box(&clip), 1.3))
    });
}

criterion_group!(benches, bench_time_stretch, bench_adjust_speed_clip);
criterion_main!(benches);
