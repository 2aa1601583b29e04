//! Benchmarks for the feedback delay send.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::dsp::delay::FeedbackDelay;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for delay_ms in [20.0, 180.0, 900.0] {
            let mut delay = FeedbackDelay::new(1_000.0, sample_rate);
            delay.set_delay_ms(delay_ms, sample_rate);
            delay.set_feedback(0.3);
            group.bench_with_input(
                BenchmarkId::new(format!("feedback_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for &sample in &input {
                            sum += delay.process(black_box(sample));
                        }
                        sum
                    })
                },
            );
        }
    }

    group.finish();
}
