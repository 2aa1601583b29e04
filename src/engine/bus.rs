//! Master bus.
//!
//! ```text
//!   voices ──→ master gain ──┬───────────────→ direct ──┐
//!                            ├──→ reverb send ──→ wet ───┼──→ compressor ──→ out
//!                            └──→ delay send ───→ wet ───┘
//! ```
//!
//! The topology never changes. Quality only fades the send levels in or out,
//! and a send that has faded to zero stops being processed. Master volume and
//! mute both move the same gain ramp, so neither can click.

use tracing::warn;

use crate::{
    config::MixConfig,
    dsp::{
        compressor::Compressor, delay::FeedbackDelay, envelope::seconds_to_samples,
        ramp::ParamRamp, reverb::SchroederReverb,
    },
    quality::QualityLevel,
};

/// Length of every gain change on the bus.
const GAIN_RAMP_SECS: f32 = 0.02;
const MAX_DELAY_MS: f32 = 1_000.0;

pub struct MixBus {
    master: ParamRamp,
    volume: f32,
    muted: bool,
    reverb: SchroederReverb,
    delay: FeedbackDelay,
    compressor: Compressor,
    reverb_level: ParamRamp,
    delay_level: ParamRamp,
    reverb_send: f32,
    delay_send: f32,
    ramp_samples: u32,
}

impl MixBus {
    pub fn new(config: &MixConfig, sample_rate: f32) -> Self {
        let mut reverb = SchroederReverb::new(sample_rate);
        reverb.set_room_size(config.reverb_room_size);
        reverb.set_damping(config.reverb_damping);

        let mut delay = FeedbackDelay::new(MAX_DELAY_MS, sample_rate);
        delay.set_delay_ms(config.delay_ms, sample_rate);
        delay.set_feedback(config.delay_feedback);

        let volume = config.master_volume.clamp(0.0, 1.0);
        Self {
            master: ParamRamp::new(volume),
            volume,
            muted: false,
            reverb,
            delay,
            compressor: Compressor::new(
                config.compressor_threshold_db,
                config.compressor_ratio,
                sample_rate,
            ),
            reverb_level: ParamRamp::new(0.0),
            delay_level: ParamRamp::new(0.0),
            reverb_send: config.reverb_send,
            delay_send: config.delay_send,
            ramp_samples: seconds_to_samples(GAIN_RAMP_SECS, sample_rate).max(1),
        }
    }

    /// Clamped to 0..=1. Non-finite values are ignored.
    pub fn set_master_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            warn!(volume, "ignoring non-finite master volume");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        if !self.muted {
            self.master.linear_to(self.volume, self.ramp_samples);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let target = if muted { 0.0 } else { self.volume };
        self.master.linear_to(target, self.ramp_samples);
    }

    pub fn master_volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Shape the summed voices in place.
    pub fn render(&mut self, buffer: &mut [f32], quality: QualityLevel) {
        let profile = quality.profile();
        let reverb_target = if profile.reverb_send { self.reverb_send } else { 0.0 };
        let delay_target = if profile.delay_send { self.delay_send } else { 0.0 };
        if self.reverb_level.target() != reverb_target {
            self.reverb_level.linear_to(reverb_target, self.ramp_samples);
        }
        if self.delay_level.target() != delay_target {
            self.delay_level.linear_to(delay_target, self.ramp_samples);
        }

        let reverb_on = !(reverb_target == 0.0 && self.reverb_level.is_settled());
        let delay_on = !(delay_target == 0.0 && self.delay_level.is_settled());

        for sample in buffer.iter_mut() {
            let dry = *sample * self.master.next();
            let mut merged = dry;
            if reverb_on {
                merged += self.reverb.process(dry * self.reverb_level.next());
            }
            if delay_on {
                merged += self.delay.process(dry * self.delay_level.next());
            }
            *sample = self.compressor.process(merged);
        }
    }

    pub fn reset(&mut self) {
        self.reverb.reset();
        self.delay.reset();
        self.compressor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::compressor::CEILING;

    const SR: f32 = 48_000.0;

    fn bus() -> MixBus {
        MixBus::new(&MixConfig::default(), SR)
    }

    #[test]
    fn volume_is_clamped_and_nan_ignored() {
        let mut bus = bus();
        bus.set_master_volume(1.7);
        assert_eq!(bus.master_volume(), 1.0);
        bus.set_master_volume(-0.2);
        assert_eq!(bus.master_volume(), 0.0);
        bus.set_master_volume(f32::NAN);
        assert_eq!(bus.master_volume(), 0.0);
    }

    #[test]
    fn mute_ramps_to_silence_and_back() {
        let mut bus = bus();
        bus.set_muted(true);

        let mut buf = vec![0.5; 2048];
        bus.render(&mut buf, QualityLevel::Low);
        assert!(buf[0] > 0.0, "mute must ramp, not cut");
        assert!(buf[2000..].iter().all(|s| *s == 0.0));

        bus.set_muted(false);
        let mut buf = vec![0.5; 2048];
        bus.render(&mut buf, QualityLevel::Low);
        assert!(buf[2047] > 0.2, "{}", buf[2047]);
    }

    #[test]
    fn many_loud_voices_never_clip() {
        let mut bus = bus();
        bus.set_master_volume(1.0);
        let mut buf: Vec<f32> = (0..48_000).map(|i| if i % 2 == 0 { 8.0 } else { -8.0 }).collect();
        bus.render(&mut buf, QualityLevel::High);
        assert!(buf.iter().all(|s| s.abs() <= CEILING));
    }

    #[test]
    fn low_quality_has_no_tail() {
        let mut bus = bus();
        let mut buf = vec![0.0; 4096];
        buf[0] = 0.5;
        bus.render(&mut buf, QualityLevel::Low);
        assert!(buf[1..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn high_quality_adds_reverb_and_delay() {
        let mut bus = bus();
        // Let the send levels settle.
        let mut warm = vec![0.0; 2048];
        bus.render(&mut warm, QualityLevel::High);

        let mut buf = vec![0.0; 48_000];
        buf[0] = 0.5;
        bus.render(&mut buf, QualityLevel::High);
        let tail = buf[1..].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(tail > 1.0e-3, "expected a wet tail, got {tail}");
    }
}
