use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Tone Generator
==============

A phase accumulator drives every waveform. `phase` runs from 0.0 to 1.0 and
wraps once per cycle; each sample advances it by `frequency / sample_rate`.

  Sine      pure tone, no overtones
  Triangle  soft, odd harmonics falling off as 1/n²
  Square    hollow, odd harmonics falling off as 1/n
  Sawtooth  bright, every harmonic falling off as 1/n

Square and sawtooth have hard discontinuities that alias badly at high
pitches. We smooth the jump with a PolyBLEP residual: a two-sample polynomial
correction applied around each discontinuity. Cheap, and good enough for
short UI tones.

Every waveform starts at (or near) zero on phase 0 so a fresh voice never
begins with a step.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::Sawtooth,
    ];

    /// Cheaper stand-in used at low quality: harmonically rich shapes fall
    /// back to a triangle.
    pub fn simplified(self) -> Self {
        match self {
            Waveform::Square | Waveform::Sawtooth => Waveform::Triangle,
            other => other,
        }
    }
}

pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Restart the cycle at phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let dt = (frequency / sample_rate).clamp(0.0, 0.5);
        let t = self.phase;

        let value = match self.waveform {
            Waveform::Sine => (TAU * t).sin(),
            Waveform::Triangle => 1.0 - 4.0 * ((t + 0.25).fract() - 0.5).abs(),
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(t, dt) - poly_blep((t + 0.5).fract(), dt)
            }
            Waveform::Sawtooth => (2.0 * t - 1.0) - poly_blep(t, dt),
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        value
    }

    /// Overwrite `out` with the waveform at a fixed frequency.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}

/// Frequency multiplier for a detune in cents (100 cents = 1 semitone).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}
