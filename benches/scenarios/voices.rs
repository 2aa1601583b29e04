//! Benchmarks for pooled discrete voices.
//!
//! A pool filled to capacity at each quality tier. High quality pays for two
//! oscillators, drive and a filter per voice; Low runs one simplified
//! oscillator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::{
    config::{PoolConfig, VoiceConfig},
    engine::pool::SignalNodePool,
    synth::{timbre, ToneSynthesizer, VoiceUnit},
    QualityLevel,
};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for quality in [QualityLevel::Low, QualityLevel::Medium, QualityLevel::High] {
            let mut pool = SignalNodePool::new(&PoolConfig::default(), quality, || VoiceUnit::new(SR));
            let mut synth = ToneSynthesizer::new(&VoiceConfig::default(), SR, 32);
            let capacity = pool.capacity();

            // Long holds so every voice stays sounding for the whole run
            let name = format!("full_pool_{quality:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    while pool.available() > 0 {
                        let facet = (synth.active_count() % capacity) as u32;
                        let spec = timbre::facet_voice(facet, 0.5, 0.5).with_hold(60_000.0);
                        if synth.render_discrete(&mut pool, &spec, quality).is_err() {
                            break;
                        }
                    }
                    buffer.fill(0.0);
                    synth.render_block(&mut pool, black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
