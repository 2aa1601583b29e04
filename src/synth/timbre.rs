//! Deterministic mapping from interaction to sound.
//!
//! A facet id picks waveform, detune and pitch through small modular tables,
//! so the same facet always has the same voice. The pointer position inside
//! the facet only nudges the pitch, by at most ±15 cents.

use crate::{
    dsp::oscillator::{cents_to_ratio, Waveform},
    synth::voice::VoiceSpec,
};

/// C4.
const BASE_HZ: f32 = 261.63;

/// C major pentatonic, in semitones above the base.
const PENTATONIC: [f32; 5] = [0.0, 2.0, 4.0, 7.0, 9.0];

const DETUNE_CENTS: [f32; 5] = [-10.0, -5.0, 0.0, 5.0, 10.0];

/// Largest pitch offset the in-facet position can add, either direction.
pub const MAX_POSITION_CENTS: f32 = 15.0;

/// Unison, major third, fifth.
pub const CHORD_RATIOS: [f32; 3] = [1.0, 5.0 / 4.0, 3.0 / 2.0];

pub fn facet_waveform(facet: u32) -> Waveform {
    Waveform::ALL[facet as usize % Waveform::ALL.len()]
}

pub fn facet_detune(facet: u32) -> f32 {
    DETUNE_CENTS[facet as usize % DETUNE_CENTS.len()]
}

/// Pentatonic degree over two octaves.
pub fn facet_frequency(facet: u32) -> f32 {
    let degree = facet as usize % (PENTATONIC.len() * 2);
    let octave = (degree / PENTATONIC.len()) as f32;
    let semitones = PENTATONIC[degree % PENTATONIC.len()] + 12.0 * octave;
    BASE_HZ * 2.0_f32.powf(semitones / 12.0)
}

/// Pitch offset from the local `(u, v)` position, bounded by
/// [`MAX_POSITION_CENTS`].
pub fn position_cents(u: f32, v: f32) -> f32 {
    let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.5 };
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 };
    ((u - 0.5) * 0.6 + (v - 0.5) * 0.4) * 2.0 * MAX_POSITION_CENTS
}

/// Base frequency (position applied) and detune for a facet.
pub fn facet_pitch(facet: u32, u: f32, v: f32) -> (f32, f32) {
    let base = facet_frequency(facet) * cents_to_ratio(position_cents(u, v));
    (base, facet_detune(facet))
}

pub fn facet_voice(facet: u32, u: f32, v: f32) -> VoiceSpec {
    let (base, detune) = facet_pitch(facet, u, v);
    VoiceSpec::new(facet_waveform(facet), base)
        .with_detune(detune)
        .with_amplitude(0.22)
        .with_envelope(8.0, 260.0)
}

/// Quieter, shorter facet tone used for pointer motion inside a facet.
/// `x`/`y` are device coordinates in -1..=1.
pub fn hover_voice(facet: u32, x: f32, y: f32) -> VoiceSpec {
    facet_voice(facet, (x + 1.0) * 0.5, (y + 1.0) * 0.5)
        .with_amplitude(0.12)
        .with_envelope(6.0, 140.0)
}

pub fn click_voice() -> VoiceSpec {
    VoiceSpec::new(Waveform::Triangle, 660.0)
        .with_amplitude(0.3)
        .with_envelope(2.0, 80.0)
}

pub fn release_voice() -> VoiceSpec {
    VoiceSpec::new(Waveform::Sine, 440.0)
        .with_amplitude(0.25)
        .with_envelope(5.0, 150.0)
}

/// G4 when a mode switches on, E4 when it switches off.
pub fn mode_root(active: bool) -> f32 {
    if active {
        392.0
    } else {
        329.63
    }
}

/// Stable waveform per mode name (FNV-1a).
pub fn mode_waveform(name: &str) -> Waveform {
    let hash = name.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ byte as u32).wrapping_mul(0x0100_0193)
    });
    Waveform::ALL[hash as usize % Waveform::ALL.len()]
}

pub fn chord_voice(waveform: Waveform, frequency: f32) -> VoiceSpec {
    VoiceSpec::new(waveform, frequency)
        .with_amplitude(0.16)
        .with_envelope(10.0, 400.0)
        .with_hold(40.0)
}
