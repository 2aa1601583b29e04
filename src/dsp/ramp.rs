//! Click-free parameter motion.
//!
//! A [`ParamRamp`] moves a value toward a target either along a straight line
//! of fixed length (crossfades, fades) or by exponential approach with a time
//! constant (slow drift of pitch and level). Snapping a parameter on a running
//! voice is what produces zipper noise and clicks; everything audible goes
//! through one of these.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Glide {
    Settled,
    Linear { step: f32, remaining: u32 },
    Approach { coeff: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRamp {
    value: f32,
    target: f32,
    glide: Glide,
}

impl ParamRamp {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            glide: Glide::Settled,
        }
    }

    /// Jump immediately. Only safe while the parameter is inaudible.
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.glide = Glide::Settled;
    }

    /// Straight line to `target`, landing exactly after `samples` steps.
    pub fn linear_to(&mut self, target: f32, samples: u32) {
        self.target = target;
        if samples == 0 {
            self.set(target);
            return;
        }
        self.glide = Glide::Linear {
            step: (target - self.value) / samples as f32,
            remaining: samples,
        };
    }

    /// Exponential approach with time constant `tau_seconds`.
    pub fn approach(&mut self, target: f32, tau_seconds: f32, sample_rate: f32) {
        self.target = target;
        let tau_samples = tau_seconds * sample_rate;
        if tau_samples <= 1.0 {
            self.set(target);
            return;
        }
        self.glide = Glide::Approach {
            coeff: 1.0 - (-1.0 / tau_samples).exp(),
        };
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        match self.glide {
            Glide::Settled => {}
            Glide::Linear { step, remaining } => {
                if remaining <= 1 {
                    self.value = self.target;
                    self.glide = Glide::Settled;
                } else {
                    self.value += step;
                    self.glide = Glide::Linear {
                        step,
                        remaining: remaining - 1,
                    };
                }
            }
            Glide::Approach { coeff } => {
                self.value += (self.target - self.value) * coeff;
                if (self.target - self.value).abs() <= 1.0e-6 * self.target.abs().max(1.0) {
                    self.value = self.target;
                    self.glide = Glide::Settled;
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.glide == Glide::Settled
    }
}

impl Default for ParamRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
