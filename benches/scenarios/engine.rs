//! Benchmarks for whole engine blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use facet_audio::{Engine, EngineConfig, TriggerEvent};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let block_secs = size as f64 / 48_000.0;

        // === HOVER SWEEP ===
        // Pointer sliding across facets, normal mode: discrete tones + sends
        let Ok(mut engine) = Engine::new(EngineConfig::default()) else {
            return;
        };
        engine.resume();
        let mut t = 0.0;
        let mut facet = 0u32;
        group.bench_with_input(BenchmarkId::new("hover_sweep", size), &size, |b, _| {
            b.iter(|| {
                t += block_secs;
                facet = facet.wrapping_add(1);
                engine.trigger(TriggerEvent::pointer_enter(facet % 12, 0.5, 0.5, t));
                engine.trigger(TriggerEvent::pointer_move(0.1, -0.2, t));
                engine.render_block(black_box(&mut buffer));
            })
        });

        // === CONTINUOUS ===
        // Hover channel gliding and crossfading
        let Ok(mut engine) = Engine::new(EngineConfig::default()) else {
            return;
        };
        engine.resume();
        engine.set_continuous_mode(true);
        let mut t = 0.0;
        let mut step = 0u32;
        group.bench_with_input(BenchmarkId::new("continuous", size), &size, |b, _| {
            b.iter(|| {
                t += block_secs;
                step = step.wrapping_add(1);
                if step % 16 == 0 {
                    engine.trigger(TriggerEvent::pointer_enter(step / 16 % 12, 0.5, 0.5, t));
                }
                let x = (step as f32 * 0.01).sin();
                engine.trigger(TriggerEvent::pointer_move(x, 0.0, t));
                engine.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
