//! hover_session - scripted pointer session rendered offline
//!
//! Run with: cargo run --example hover_session
//! Live:     cargo run --example hover_session --features cpal_output -- --live
//!
//! Set RUST_LOG=facet_audio=debug to watch crossfades and quality changes.

use color_eyre::eyre::{Result, WrapErr};
use facet_audio::{Engine, EngineConfig, EngineStatus, TriggerEvent};
use tracing_subscriber::EnvFilter;

const BLOCK: usize = 480;

/// A pointer sweeping over facets, a click, a mode toggle, a continuous
/// glide, then leaving the object.
fn script() -> Vec<(f64, ScriptStep)> {
    let mut steps = Vec::new();
    for i in 0..8u32 {
        let t = i as f64 * 0.15;
        steps.push((t, ScriptStep::Event(TriggerEvent::pointer_enter(i, 0.5, 0.5, t))));
        for j in 1..10 {
            let mt = t + j as f64 * 0.012;
            let x = (mt * 3.0).sin() as f32;
            steps.push((mt, ScriptStep::Event(TriggerEvent::pointer_move(x, 0.2, mt))));
        }
    }
    steps.push((1.3, ScriptStep::Event(TriggerEvent::press(1.3))));
    steps.push((1.38, ScriptStep::Event(TriggerEvent::release(1.38))));
    steps.push((1.6, ScriptStep::Event(TriggerEvent::mode_toggle("rainbow", true, 1.6))));
    steps.push((2.0, ScriptStep::Continuous(true)));
    for i in 0..60 {
        let t = 2.0 + i as f64 * 0.02;
        if i % 15 == 0 {
            let facet = 20 + i / 15;
            steps.push((t, ScriptStep::Event(TriggerEvent::pointer_enter(facet, 0.3, 0.6, t))));
        }
        let x = (t * 2.0).cos() as f32;
        steps.push((t, ScriptStep::Event(TriggerEvent::pointer_move(x, -0.4, t))));
    }
    steps.push((3.3, ScriptStep::Event(TriggerEvent::leave(3.3))));
    steps
}

enum ScriptStep {
    Event(TriggerEvent),
    Continuous(bool),
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if std::env::args().any(|arg| arg == "--live") {
        return live();
    }

    let config = EngineConfig::default();
    let sample_rate = config.sample_rate;
    let mut engine = Engine::new(config).wrap_err("engine config rejected")?;
    engine.resume();

    let steps = script();
    let mut next = 0;
    let mut block = vec![0.0f32; BLOCK];
    let block_secs = BLOCK as f64 / sample_rate as f64;
    let mut last: Option<EngineStatus> = None;

    println!("=== hover session ===");
    println!("{:>6}  {:>7}  {:>7}  status", "t", "peak", "rms");

    for n in 0..(4.0 / block_secs) as usize {
        let now = n as f64 * block_secs;
        while next < steps.len() && steps[next].0 <= now {
            match &steps[next].1 {
                ScriptStep::Event(event) => engine.trigger(event.clone()),
                ScriptStep::Continuous(enabled) => engine.set_continuous_mode(*enabled),
            }
            next += 1;
        }
        engine.tick(now);
        engine.render_block(&mut block);

        if n % 10 == 0 {
            let peak = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            let rms = (block.iter().map(|s| s * s).sum::<f32>() / BLOCK as f32).sqrt();
            let status = engine.status();
            let changed = last.map_or(true, |prev| prev != status);
            println!(
                "{now:>6.2}  {peak:>7.4}  {rms:>7.4}  {}",
                if changed { format!("{status:?}") } else { String::new() }
            );
            last = Some(status);
        }
    }

    Ok(())
}

#[cfg(feature = "cpal_output")]
fn live() -> Result<()> {
    use facet_audio::io::{output::CpalOutput, ControlMessage};
    use std::time::Duration;

    let mut output = CpalOutput::start(EngineConfig::default()).wrap_err("no audio output")?;
    println!("Playing on {} channels at {} Hz", output.channels(), output.sample_rate());

    // Script times are on the output's clock.
    for (at, step) in script() {
        std::thread::sleep(Duration::from_secs_f64((at - output.now()).max(0.0)));
        let msg = match step {
            ScriptStep::Event(event) => ControlMessage::Trigger(event),
            ScriptStep::Continuous(enabled) => ControlMessage::SetContinuousMode(enabled),
        };
        output.send(msg);
    }
    std::thread::sleep(Duration::from_millis(800));
    if let Some(status) = output.latest_status() {
        println!("{status:?}");
    }
    Ok(())
}

#[cfg(not(feature = "cpal_output"))]
fn live() -> Result<()> {
    Err(color_eyre::eyre::eyre!(
        "live playback needs --features cpal_output"
    ))
}
