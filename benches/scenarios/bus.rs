//! Benchmarks for the master bus at its default settings.
//!
//! High runs both sends, Medium only the reverb, Low skips both once their
//! levels have faded out, leaving gain and compressor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::{config::MixConfig, engine::bus::MixBus, QualityLevel};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bus");

    for &size in BLOCK_SIZES {
        // A few summed voices worth of signal
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 * 0.05).sin() * 0.6 + (i as f32 * 0.13).sin() * 0.3)
            .collect();
        let mut buffer = input.clone();

        for quality in [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low] {
            let mut bus = MixBus::new(&MixConfig::default(), SR);
            // Let the send levels settle for this tier
            let mut warm = vec![0.0f32; 4096];
            bus.render(&mut warm, quality);

            let name = format!("{quality:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    bus.render(black_box(&mut buffer), quality);
                })
            });
        }
    }

    group.finish();
}
