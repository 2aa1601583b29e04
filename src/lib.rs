//! Procedural interface audio.
//!
//! Pointer events from a presentation layer go in, short synthesized tones
//! and a continuous hover voice come out. The engine stays inside a fixed
//! voice budget, drops what it cannot afford, and trades timbre for headroom
//! when it keeps failing.
//!
//! ```no_run
//! use facet_audio::{Engine, EngineConfig, TriggerEvent};
//!
//! let mut engine = Engine::new(EngineConfig::default())?;
//! engine.resume();
//! engine.trigger(TriggerEvent::pointer_enter(3, 0.4, 0.6, 0.0));
//!
//! let mut block = [0.0_f32; 512];
//! engine.render_block(&mut block);
//! # Ok::<(), facet_audio::EngineError>(())
//! ```

pub mod config;
pub mod dsp; // Signal primitives
pub mod engine; // Scheduling, pooling, degradation, mixing
pub mod error;
pub mod io; // Events in, control messages, device out
pub mod quality;
pub mod synth; // Discrete tones and the hover channel

pub use config::EngineConfig;
pub use engine::{ContextState, Engine, EngineStatus};
pub use error::{EngineError, Result};
pub use io::event::{TriggerEvent, TriggerKind};
pub use quality::QualityLevel;

/// Largest block rendered in one pass. Longer buffers are split.
pub const MAX_BLOCK_SIZE: usize = 2048;
