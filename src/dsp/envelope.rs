/*
One-Shot Amplitude Envelope
===========================

Every discrete UI tone (click, release, facet crossing, chord note) is shaped
by the same envelope: a linear rise, an optional hold, and an exponential fall
back to silence.

  Level
   peak ┐    ╱‾‾‾‾‾‾╲
        │   ╱        ╲
        │  ╱          ╲_
        │ ╱             ‾‾‾──___
   0.0  └╱───────────────────────┴──→ Time
         Attack  Sustain  Release  (guard)


Why linear up and exponential down
----------------------------------

The attack is only a few milliseconds. A straight line there is cheap and,
because it starts from exactly zero, never clicks.

Releases are longer and the ear hears loudness logarithmically. A linear fall
sounds like it "drops off a cliff" at the end; an exponential fall spends equal
time in each decibel band, which reads as a smooth natural decay.


The Math: Exponential Release
-----------------------------

An exponential can never reach zero, so we aim for a floor of -80 dB and
snap to 0.0 on the final sample:

    mult  = (FLOOR / start_level) ^ (1 / release_samples)
    level = level * mult              (once per sample)

After `release_samples` multiplications the level is exactly FLOOR, and the
stage moves to Idle at 0.0.


Stages
------

    Idle ──trigger──→ Attack ──level=peak──→ Sustain ──hold done──→ Release
     ↑                   │                      │                      │
     │                   └──────release()───────┴──────────→ ──────────┤
     └──────────────────────────────level=0────────────────────────────┘

`release()` from Attack or Sustain always starts the fall from the CURRENT
level, never from the peak, so an early cut does not jump.
*/

/// Level treated as silence at the end of an exponential release (-80 dB).
pub const SILENCE_FLOOR: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Sustain,
    Release,
}

pub struct Envelope {
    peak: f32,
    attack_samples: u32,
    hold_samples: u32,
    release_samples: u32,

    stage: EnvelopeStage,
    level: f32,
    elapsed: u32,
    release_mult: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self {
            peak: 1.0,
            attack_samples: 0,
            hold_samples: 0,
            release_samples: 1,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            elapsed: 0,
            release_mult: 0.0,
        }
    }

    /// Set the shape for the next trigger. Times are in seconds.
    pub fn configure(&mut self, peak: f32, attack: f32, hold: f32, release: f32, sample_rate: f32) {
        self.peak = peak.clamp(0.0, 1.0);
        self.attack_samples = seconds_to_samples(attack, sample_rate);
        self.hold_samples = seconds_to_samples(hold, sample_rate);
        self.release_samples = seconds_to_samples(release, sample_rate).max(1);
    }

    /// Start the attack from zero.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.elapsed = 0;
        self.stage = if self.attack_samples == 0 {
            self.level = self.peak;
            EnvelopeStage::Sustain
        } else {
            EnvelopeStage::Attack
        };
    }

    /// Begin the release from the current level.
    pub fn release(&mut self) {
        let samples = self.release_samples;
        self.release_over(samples);
    }

    /// Replace whatever is scheduled with a release of `samples` length.
    pub fn release_over(&mut self, samples: u32) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        if self.level <= SILENCE_FLOOR {
            self.reset();
            return;
        }

        let samples = samples.max(1);
        self.release_samples = samples;
        self.release_mult = (SILENCE_FLOOR / self.level).powf(1.0 / samples as f32);
        self.elapsed = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.elapsed += 1;
                self.level = self.peak * self.elapsed as f32 / self.attack_samples as f32;
                if self.elapsed >= self.attack_samples {
                    self.level = self.peak;
                    self.elapsed = 0;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.peak;
                if self.elapsed >= self.hold_samples {
                    self.release();
                } else {
                    self.elapsed += 1;
                }
            }
            EnvelopeStage::Release => {
                self.elapsed += 1;
                self.level *= self.release_mult;
                if self.elapsed >= self.release_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Samples from trigger until the level is back at zero.
    pub fn one_shot_samples(&self) -> u32 {
        self.attack_samples + self.hold_samples + 1 + self.release_samples
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.elapsed = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub(crate) fn seconds_to_samples(seconds: f32, sample_rate: f32) -> u32 {
    (seconds.max(0.0) * sample_rate).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn run(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_is_linear_and_reaches_peak() {
        let mut env = Envelope::new();
        env.configure(0.5, 0.01, 0.0, 0.1, SAMPLE_RATE);
        env.trigger();

        let first = env.next_sample();
        let second = env.next_sample();
        assert!((first - 0.05).abs() < 1e-6);
        assert!((second - 0.10).abs() < 1e-6);

        run(&mut env, 8);
        assert!((env.level() - 0.5).abs() < 1e-6);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn release_decays_exponentially_to_idle() {
        let mut env = Envelope::new();
        env.configure(1.0, 0.0, 0.0, 0.1, SAMPLE_RATE);
        env.trigger();
        env.next_sample();
        assert_eq!(env.stage(), EnvelopeStage::Release);

        // Equal ratio between consecutive samples is the exponential signature.
        let a = env.next_sample();
        let b = env.next_sample();
        let c = env.next_sample();
        assert!(((b / a) - (c / b)).abs() < 1e-4);

        run(&mut env, 200);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn one_shot_drains_within_its_reported_length() {
        let mut env = Envelope::new();
        env.configure(0.8, 0.005, 0.02, 0.05, SAMPLE_RATE);
        env.trigger();
        let n = env.one_shot_samples() as usize;
        run(&mut env, n);
        assert!(!env.is_active());
    }

    #[test]
    fn early_release_starts_from_current_level() {
        let mut env = Envelope::new();
        env.configure(1.0, 0.02, 0.0, 0.05, SAMPLE_RATE);
        env.trigger();
        run(&mut env, 10);
        let before = env.level();
        env.release();
        let after = env.next_sample();
        assert!(after < before && after > before * 0.5, "{before} -> {after}");
    }

    #[test]
    fn release_on_idle_is_a_no_op() {
        let mut env = Envelope::new();
        env.release();
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }
}
