//! Bus compressor.
//!
//! Feed-forward peak compressor that sits after the sends merge. When dozens
//! of hover tones coincide the summed signal would clip; the compressor pulls
//! it down smoothly, and a hard ceiling after it catches whatever the attack
//! lets through.
//!
//! ```text
//! level_db  = 20·log10(|x|)
//! over      = level_db - threshold
//! reduction = over · (1 - 1/ratio)            (0 when over ≤ 0)
//! env       = one-pole(reduction, attack | release)
//! y         = x · 10^(-env / 20)
//! ```

/// Absolute output ceiling after gain reduction.
pub const CEILING: f32 = 0.98;

pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope_db: f32,
}

impl Compressor {
    pub fn new(threshold_db: f32, ratio: f32, sample_rate: f32) -> Self {
        Self {
            threshold_db,
            ratio: ratio.clamp(1.0, 20.0),
            attack_coeff: time_coeff(0.005, sample_rate),
            release_coeff: time_coeff(0.120, sample_rate),
            envelope_db: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let level_db = 20.0 * sample.abs().max(1.0e-10).log10();
        let over = level_db - self.threshold_db;
        let target = if over > 0.0 {
            over * (1.0 - 1.0 / self.ratio)
        } else {
            0.0
        };

        let coeff = if target > self.envelope_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope_db = coeff * self.envelope_db + (1.0 - coeff) * target;

        let gain = 10.0_f32.powf(-self.envelope_db / 20.0);
        (sample * gain).clamp(-CEILING, CEILING)
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Current gain reduction in dB (positive = quieter).
    pub fn reduction_db(&self) -> f32 {
        self.envelope_db
    }

    pub fn reset(&mut self) {
        self.envelope_db = 0.0;
    }
}

fn time_coeff(seconds: f32, sample_rate: f32) -> f32 {
    (-1.0 / (seconds * sample_rate)).exp()
}
