use std::f32::consts::PI;

/*
Voice Lowpass
=============

A topology-preserving-transform state-variable filter, lowpass output only.
Discrete tones run through it to take the edge off square and saw timbres.

    g = tan(π · cutoff / sample_rate)
    k = 2 - 2 · resonance

Coefficients are cached when the cutoff or sample rate changes, so the per
sample cost is a handful of multiply-adds. The two integrator states must be
cleared when a pooled voice is reused, otherwise the new note starts with the
old note's energy.
*/

pub struct LowpassFilter {
    ic1eq: f32,
    ic2eq: f32,
    cutoff_hz: f32,
    resonance: f32,
    g: f32,
    k: f32,
    h: f32,
}

impl LowpassFilter {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
            h: 0.0,
        };
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let nyquist_guard = sample_rate * 0.49;
        self.cutoff_hz = cutoff_hz.clamp(20.0, nyquist_guard);
        self.g = (PI * self.cutoff_hz / sample_rate).tan();
        self.update_h();
    }

    /// 0.0 is flat, values toward 1.0 add a peak at the cutoff.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.95);
        self.k = 2.0 - 2.0 * self.resonance;
        self.update_h();
    }

    fn update_h(&mut self) {
        self.h = 1.0 / (1.0 + self.g * (self.g + self.k));
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let v3 = sample - self.ic2eq;
        let v1 = self.h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;
        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }
}
