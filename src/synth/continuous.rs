//! The continuous hover channel.
//!
//! Two long-lived voices, never released back to the pool. One is primary
//! (audible), the other waits silent but running for the next facet change.
//!
//! ```text
//!            update_target             retarget
//!   Silent ───────────────→ Sustaining ─────────→ Crossfading
//!     ↑     (fade in)          ↑  │ update_target     │  window ends:
//!     │                        │  └ (30ms glide)      │  roles swap
//!     │                        └──────────────────────┘
//!     └──────── silence() from any state (fade out)
//! ```
//!
//! A crossfade moves gain from the outgoing voice to the incoming one along
//! two complementary straight lines, so their sum stays at the level the
//! channel had when the crossfade began. A crossfade only starts once the
//! secondary voice is inaudible: a retarget that arrives mid-crossfade, or
//! while a fade-in is still pulling the other voice down, is parked and
//! started as soon as that voice is silent. Only the latest parked target is
//! kept.

use tracing::debug;

use crate::{
    config::ContinuousConfig,
    dsp::{
        envelope::seconds_to_samples,
        oscillator::{cents_to_ratio, OscillatorBlock, Waveform},
        ramp::ParamRamp,
    },
    quality::QualityLevel,
};

/// Gain at or below this counts as inaudible.
const SILENT_GAIN: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousState {
    Silent,
    Sustaining,
    Crossfading,
}

struct Channel {
    osc: OscillatorBlock,
    frequency: ParamRamp,
    detune: ParamRamp,
    gain: ParamRamp,
}

impl Channel {
    fn new(waveform: Waveform) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: ParamRamp::new(440.0),
            detune: ParamRamp::new(0.0),
            gain: ParamRamp::new(0.0),
        }
    }

    /// Jump to new parameters. Only while inaudible.
    fn tune(&mut self, frequency: f32, detune: f32) {
        self.osc.reset();
        self.frequency.set(frequency);
        self.detune.set(detune);
    }

    #[inline]
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let gain = self.gain.next();
        let frequency = self.frequency.next();
        let detune = self.detune.next();
        if gain <= 0.0 && self.gain.is_settled() {
            return 0.0;
        }
        self.osc.next_sample(frequency * cents_to_ratio(detune), sample_rate) * gain
    }
}

pub struct ContinuousVoiceEngine {
    channels: [Channel; 2],
    primary: usize,
    state: ContinuousState,
    /// Amplitude the channel should settle at.
    level: f32,
    crossfade_samples: u32,
    crossfade_remaining: u32,
    pending: Option<(f32, f32)>,
    config: ContinuousConfig,
    sample_rate: f32,
}

impl ContinuousVoiceEngine {
    pub fn new(config: &ContinuousConfig, sample_rate: f32, quality: QualityLevel) -> Self {
        let mut engine = Self {
            channels: [Channel::new(Waveform::Sine), Channel::new(Waveform::Sine)],
            primary: 0,
            state: ContinuousState::Silent,
            level: 0.0,
            crossfade_samples: 1,
            crossfade_remaining: 0,
            pending: None,
            config: config.clone(),
            sample_rate,
        };
        engine.set_quality(quality);
        engine
    }

    /// Adopt the crossfade window of `quality`. A crossfade already running
    /// keeps its length.
    pub fn set_quality(&mut self, quality: QualityLevel) {
        let seconds = quality.profile().crossfade_ms / 1000.0;
        self.crossfade_samples = seconds_to_samples(seconds, self.sample_rate).max(1);
    }

    /// Slow drift: glide the primary voice toward new parameters.
    pub fn update_target(&mut self, frequency: f32, detune: f32, amplitude: f32) {
        if !(frequency.is_finite() && frequency > 0.0 && detune.is_finite() && amplitude.is_finite()) {
            return;
        }
        let amplitude = amplitude.clamp(0.0, 1.0);
        self.level = amplitude;
        let tau = self.config.smoothing_ms / 1000.0;

        match self.state {
            ContinuousState::Silent => {
                self.fade_in(frequency, detune, amplitude);
            }
            ContinuousState::Sustaining => {
                let sr = self.sample_rate;
                let voice = &mut self.channels[self.primary];
                voice.frequency.approach(frequency, tau, sr);
                voice.detune.approach(detune, tau, sr);
                voice.gain.approach(amplitude, tau, sr);
            }
            ContinuousState::Crossfading => {
                // Gain belongs to the crossfade; the new level is picked up
                // when it ends.
                let sr = self.sample_rate;
                let voice = &mut self.channels[self.primary];
                voice.frequency.approach(frequency, tau, sr);
                voice.detune.approach(detune, tau, sr);
            }
        }
    }

    /// Facet change: crossfade to a voice at the new pitch.
    pub fn retarget(&mut self, frequency: f32, detune: f32) {
        if !(frequency.is_finite() && frequency > 0.0 && detune.is_finite()) {
            return;
        }
        match self.state {
            ContinuousState::Silent => {
                self.level = self.config.default_amplitude;
                self.fade_in(frequency, detune, self.level);
            }
            ContinuousState::Sustaining if self.secondary_is_silent() => {
                self.start_crossfade(frequency, detune)
            }
            _ => self.pending = Some((frequency, detune)),
        }
    }

    /// Fade everything out. The voices keep running, silent.
    pub fn silence(&mut self) {
        if self.state == ContinuousState::Silent {
            return;
        }
        let samples = self.ms_to_samples(self.config.fade_out_ms);
        for channel in &mut self.channels {
            channel.gain.linear_to(0.0, samples);
        }
        self.pending = None;
        self.crossfade_remaining = 0;
        self.level = 0.0;
        self.state = ContinuousState::Silent;
        debug!("continuous channel fading out");
    }

    /// Cut to zero at once. Used when the device goes away.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.gain.set(0.0);
            channel.osc.reset();
        }
        self.pending = None;
        self.crossfade_remaining = 0;
        self.level = 0.0;
        self.state = ContinuousState::Silent;
    }

    /// Add the channel into `out`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        if self.state == ContinuousState::Silent && !self.is_audible() {
            return;
        }
        let sr = self.sample_rate;
        for sample in out.iter_mut() {
            let [a, b] = &mut self.channels;
            *sample += a.next_sample(sr) + b.next_sample(sr);

            match self.state {
                ContinuousState::Crossfading => {
                    self.crossfade_remaining = self.crossfade_remaining.saturating_sub(1);
                    if self.crossfade_remaining == 0 {
                        self.finish_crossfade();
                    }
                }
                ContinuousState::Sustaining
                    if self.pending.is_some() && self.secondary_is_silent() =>
                {
                    if let Some((frequency, detune)) = self.pending.take() {
                        self.start_crossfade(frequency, detune);
                    }
                }
                _ => {}
            }
        }
    }

    fn fade_in(&mut self, frequency: f32, detune: f32, amplitude: f32) {
        // Prefer the quieter voice; after a fade-out the other may still ring.
        let idx = if self.channels[0].gain.value() <= self.channels[1].gain.value() {
            0
        } else {
            1
        };
        let samples = self.ms_to_samples(self.config.fade_in_ms);
        let tau = self.config.smoothing_ms / 1000.0;
        let sr = self.sample_rate;

        let voice = &mut self.channels[idx];
        if voice.gain.value() <= SILENT_GAIN {
            voice.tune(frequency, detune);
        } else {
            voice.frequency.approach(frequency, tau, sr);
            voice.detune.approach(detune, tau, sr);
        }
        voice.gain.linear_to(amplitude, samples);

        let other = &mut self.channels[1 - idx];
        other.gain.linear_to(0.0, samples);

        self.primary = idx;
        self.state = ContinuousState::Sustaining;
    }

    fn secondary_is_silent(&self) -> bool {
        self.channels[1 - self.primary].gain.value() <= SILENT_GAIN
    }

    /// Callers make sure the secondary voice is inaudible first.
    fn start_crossfade(&mut self, frequency: f32, detune: f32) {
        let outgoing = self.primary;
        let incoming = 1 - outgoing;
        let n = self.crossfade_samples;
        let from = self.channels[outgoing].gain.value() + self.channels[incoming].gain.value();

        // The incoming ramp starts wherever that voice is, so the two lines
        // stay complementary around `from`.
        let voice = &mut self.channels[incoming];
        if voice.gain.value() <= SILENT_GAIN {
            voice.tune(frequency, detune);
        } else {
            let tau = self.config.smoothing_ms / 1000.0;
            voice.frequency.approach(frequency, tau, self.sample_rate);
            voice.detune.approach(detune, tau, self.sample_rate);
        }
        voice.gain.linear_to(from, n);
        self.channels[outgoing].gain.linear_to(0.0, n);

        self.primary = incoming;
        self.crossfade_remaining = n;
        self.state = ContinuousState::Crossfading;
        debug!(frequency, samples = n, "continuous crossfade started");
    }

    fn finish_crossfade(&mut self) {
        self.state = ContinuousState::Sustaining;
        debug!("continuous crossfade finished");

        if let Some((frequency, detune)) = self.pending.take() {
            self.start_crossfade(frequency, detune);
            return;
        }
        let voice = &mut self.channels[self.primary];
        if (voice.gain.value() - self.level).abs() > SILENT_GAIN {
            voice
                .gain
                .approach(self.level, self.config.smoothing_ms / 1000.0, self.sample_rate);
        }
    }

    fn ms_to_samples(&self, ms: f32) -> u32 {
        seconds_to_samples(ms / 1000.0, self.sample_rate).max(1)
    }

    pub fn state(&self) -> ContinuousState {
        self.state
    }

    /// Current gains as `(primary, secondary)`.
    pub fn amplitudes(&self) -> (f32, f32) {
        (
            self.channels[self.primary].gain.value(),
            self.channels[1 - self.primary].gain.value(),
        )
    }

    /// Current pitch of the primary voice, detune applied.
    pub fn frequency(&self) -> f32 {
        let voice = &self.channels[self.primary];
        voice.frequency.value() * cents_to_ratio(voice.detune.value())
    }

    pub fn is_audible(&self) -> bool {
        self.channels
            .iter()
            .any(|c| c.gain.value() > 0.0 || !c.gain.is_settled())
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
