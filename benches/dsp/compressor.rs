//! Benchmarks for the bus compressor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::dsp::compressor::Compressor;

use crate::BLOCK_SIZES;

pub fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/compressor");

    for &size in BLOCK_SIZES {
        // Hot enough to keep the gain computer busy
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 1.5).collect();
        let mut buffer = input.clone();

        let mut comp = Compressor::new(-12.0, 4.0, 48_000.0);
        group.bench_with_input(BenchmarkId::new("bus", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                comp.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
