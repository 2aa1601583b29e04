#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::VoiceConfig,
    dsp::{
        distortion::saturate,
        envelope::{Envelope, EnvelopeStage},
        filter::LowpassFilter,
        oscillator::{cents_to_ratio, OscillatorBlock, Waveform},
    },
    engine::pool::PoolSlot,
    error::{EngineError, Result},
    quality::QualityProfile,
};

/// Amplitude-envelope stage of a voice.
pub type VoiceStage = EnvelopeStage;

pub type VoiceId = u64;

/// Spread of the second unison oscillator at high quality.
const UNISON_CENTS: f32 = 7.0;

/// Everything needed to play one discrete tone.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSpec {
    pub waveform: Waveform,
    pub base_frequency: f32,
    pub detune_cents: f32,
    /// Envelope peak, 0..=1.
    pub amplitude: f32,
    pub attack_ms: f32,
    /// Time held at peak before the release starts.
    pub hold_ms: f32,
    pub release_ms: f32,
}

impl VoiceSpec {
    pub fn new(waveform: Waveform, base_frequency: f32) -> Self {
        Self {
            waveform,
            base_frequency,
            detune_cents: 0.0,
            amplitude: 0.25,
            attack_ms: 5.0,
            hold_ms: 0.0,
            release_ms: 150.0,
        }
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_envelope(mut self, attack_ms: f32, release_ms: f32) -> Self {
        self.attack_ms = attack_ms;
        self.release_ms = release_ms;
        self
    }

    pub fn with_hold(mut self, hold_ms: f32) -> Self {
        self.hold_ms = hold_ms;
        self
    }

    /// Pitch actually played, detune applied.
    pub fn frequency(&self) -> f32 {
        self.base_frequency * cents_to_ratio(self.detune_cents)
    }

    /// Reject anything the render path could not play as asked.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return rejected(format!("frequency {} is not a positive pitch", self.base_frequency));
        }
        if !self.detune_cents.is_finite() {
            return rejected("detune is not finite");
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return rejected(format!("amplitude {} outside 0..=1", self.amplitude));
        }
        for (name, ms) in [
            ("attack", self.attack_ms),
            ("hold", self.hold_ms),
            ("release", self.release_ms),
        ] {
            if !(ms.is_finite() && ms >= 0.0) {
                return rejected(format!("{name} time {ms}ms must be a non-negative duration"));
            }
        }
        if self.release_ms == 0.0 {
            return rejected("release time must be non-zero");
        }
        Ok(())
    }
}

fn rejected<T>(msg: impl Into<String>) -> Result<T> {
    Err(EngineError::EnvelopeScheduling(msg.into()))
}

/// Returned for every voice that started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    pub id: VoiceId,
    /// `None` for long-lived voices that do not come from the pool.
    pub slot: Option<PoolSlot>,
}

/// Bookkeeping for one sounding voice. The DSP lives in the pool slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub id: VoiceId,
    pub waveform: Waveform,
    pub base_frequency: f32,
    pub detune_cents: f32,
    pub stage: VoiceStage,
    /// Render-clock seconds.
    pub created_at: f64,
    /// Render-clock seconds at which the slot is handed back.
    pub stop_at: f64,
    pub slot: Option<PoolSlot>,
}

impl Voice {
    pub fn handle(&self) -> VoiceHandle {
        VoiceHandle {
            id: self.id,
            slot: self.slot,
        }
    }
}

/// The signal chain held in one pool slot.
///
/// oscillator(s) → drive → lowpass → envelope, summed into the output.
/// Which stages run is fixed at `start` from the quality profile, so a voice
/// keeps its timbre even if quality changes mid-note.
pub struct VoiceUnit {
    oscillators: [OscillatorBlock; 2],
    envelope: Envelope,
    filter: LowpassFilter,
    frequency: f32,
    unison_ratio: f32,
    layers: usize,
    filter_on: bool,
    drive: Option<f32>,
    sample_rate: f32,
}

impl VoiceUnit {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillators: [OscillatorBlock::sine(), OscillatorBlock::sine()],
            envelope: Envelope::new(),
            filter: LowpassFilter::new(VoiceConfig::default().filter_cutoff_hz, sample_rate),
            frequency: 440.0,
            unison_ratio: cents_to_ratio(UNISON_CENTS),
            layers: 1,
            filter_on: false,
            drive: None,
            sample_rate,
        }
    }

    pub fn start(&mut self, spec: &VoiceSpec, profile: &QualityProfile, config: &VoiceConfig) {
        let waveform = if profile.simple_waveforms {
            spec.waveform.simplified()
        } else {
            spec.waveform
        };
        for osc in &mut self.oscillators {
            osc.set_waveform(waveform);
            osc.reset();
        }

        self.frequency = spec.frequency();
        self.layers = profile.oscillators_per_voice.clamp(1, self.oscillators.len());
        self.filter_on = profile.voice_filter;
        self.drive = profile.voice_drive.then_some(config.drive);

        self.filter.reset();
        self.filter.set_cutoff(config.filter_cutoff_hz, self.sample_rate);

        self.envelope.configure(
            spec.amplitude,
            spec.attack_ms / 1000.0,
            spec.hold_ms / 1000.0,
            spec.release_ms / 1000.0,
            self.sample_rate,
        );
        self.envelope.trigger();
    }

    /// Add this voice into `out`.
    pub fn render_add(&mut self, out: &mut [f32]) {
        if !self.envelope.is_active() {
            return;
        }
        let layer_gain = 1.0 / self.layers as f32;
        let unison_freq = self.frequency * self.unison_ratio;

        for sample in out.iter_mut() {
            let mut s = self.oscillators[0].next_sample(self.frequency, self.sample_rate);
            if self.layers > 1 {
                s += self.oscillators[1].next_sample(unison_freq, self.sample_rate);
            }
            s *= layer_gain;

            if let Some(drive) = self.drive {
                s = saturate(s, drive);
            }
            if self.filter_on {
                s = self.filter.process(s);
            }
            *sample += s * self.envelope.next_sample();
        }
    }

    /// Samples from trigger to silence for the current envelope.
    pub fn one_shot_samples(&self) -> u32 {
        self.envelope.one_shot_samples()
    }

    pub fn stage(&self) -> VoiceStage {
        self.envelope.stage()
    }

    pub fn level(&self) -> f32 {
        self.envelope.level()
    }

    /// Cut immediately. Used when the slot is taken away.
    pub fn silence(&mut self) {
        self.envelope.reset();
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityLevel;

    #[test]
    fn spec_validation_rejects_malformed_envelopes() {
        let ok = VoiceSpec::new(Waveform::Sine, 440.0);
        assert!(ok.validate().is_ok());

        let negative = ok.with_envelope(-1.0, 100.0);
        assert!(matches!(negative.validate(), Err(EngineError::EnvelopeScheduling(_))));

        let no_release = ok.with_envelope(5.0, 0.0);
        assert!(no_release.validate().is_err());

        let nan_pitch = VoiceSpec::new(Waveform::Sine, f32::NAN);
        assert!(nan_pitch.validate().is_err());

        let loud = ok.with_amplitude(1.5);
        assert!(loud.validate().is_err());
    }

    #[test]
    fn unit_renders_and_falls_silent() {
        let sr = 48_000.0;
        let mut unit = VoiceUnit::new(sr);
        let spec = VoiceSpec::new(Waveform::Square, 330.0).with_envelope(2.0, 50.0);
        unit.start(&spec, &QualityLevel::High.profile(), &VoiceConfig::default());

        let total = unit.one_shot_samples() as usize;
        let mut out = vec![0.0; total + 64];
        unit.render_add(&mut out);

        let peak = out.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.05, "voice should be audible, peak {peak}");
        assert!(out[total..].iter().all(|s| *s == 0.0), "tail must be silent");
        assert_eq!(unit.stage(), VoiceStage::Idle);
    }

    #[test]
    fn silence_cuts_output() {
        let mut unit = VoiceUnit::new(48_000.0);
        let spec = VoiceSpec::new(Waveform::Sine, 440.0).with_hold(500.0);
        unit.start(&spec, &QualityLevel::Low.profile(), &VoiceConfig::default());
        unit.silence();

        let mut out = [0.0; 128];
        unit.render_add(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
