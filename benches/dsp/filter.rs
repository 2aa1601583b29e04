//! Benchmarks for the voice lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::dsp::filter::LowpassFilter;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.3).sin()).collect();
        let mut buffer = input.clone();

        let mut filter = LowpassFilter::new(3_500.0, 48_000.0);
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
