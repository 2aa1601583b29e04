//! Benchmarks for the one-shot envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::dsp::envelope::Envelope;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack and release both in flight across iterations
        let mut env = Envelope::new();
        env.configure(0.8, 0.002, 0.0, 0.08, 48_000.0);
        group.bench_with_input(BenchmarkId::new("one_shot", size), &size, |b, _| {
            b.iter(|| {
                if !env.is_active() {
                    env.trigger();
                }
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
