//! Scenario benchmarks.
//!
//! Pooled discrete voices and the master bus at each quality tier, and full
//! engine blocks with the hover channel running.

mod bus;
mod engine;
mod voices;

pub use bus::bench_bus;
pub use engine::bench_engine;
pub use voices::bench_voices;
