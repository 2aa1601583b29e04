//! Low-level DSP primitives used by voices and the mix bus.
//!
//! These components do not allocate after construction, making them safe to
//! embed inside pooled voice units. They stay focused on the signal math;
//! lifecycle and scheduling live in `synth` and `engine`.

/// Feed-forward bus compressor with a hard ceiling.
pub mod compressor;
/// Feedback delay line for the delay send.
pub mod delay;
/// Normalised soft saturation.
pub mod distortion;
/// Linear-attack, exponential-release one-shot envelope.
pub mod envelope;
/// TPT state-variable lowpass.
pub mod filter;
/// Band-limited tone generators.
pub mod oscillator;
/// Linear and exponential parameter ramps.
pub mod ramp;
/// Schroeder reverb for the reverb send.
pub mod reverb;

pub use envelope::EnvelopeStage;
pub use oscillator::Waveform;
