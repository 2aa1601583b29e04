//! Engine configuration.
//!
//! All numbers here are tunable defaults. `EngineConfig::validate` is run by
//! `Engine::new` so a bad config never reaches the render path.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{EngineError, Result},
    quality::QualityLevel,
};

/// Smallest guard margin allowed between envelope end and generator stop.
pub const MIN_GUARD_MS: f32 = 10.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Quality level the session starts at.
    pub initial_quality: QualityLevel,
    pub scheduler: SchedulerConfig,
    pub breaker: BreakerConfig,
    pub pool: PoolConfig,
    pub voice: VoiceConfig,
    pub continuous: ContinuousConfig,
    pub mix: MixConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            initial_quality: QualityLevel::High,
            scheduler: SchedulerConfig::default(),
            breaker: BreakerConfig::default(),
            pool: PoolConfig::default(),
            voice: VoiceConfig::default(),
            continuous: ContinuousConfig::default(),
            mix: MixConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate >= 8_000.0) {
            return invalid(format!("sample rate {} is too low", self.sample_rate));
        }
        self.scheduler.validate()?;
        self.breaker.validate()?;
        self.pool.validate()?;
        self.voice.validate()?;
        self.continuous.validate()?;
        self.mix.validate()
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Positional triggers forwarded per rolling second outside continuous mode.
    pub max_triggers_per_second: u32,
    /// Forwarded triggers held while the device is suspended.
    pub suspended_queue_len: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_triggers_per_second: 30,
            suspended_queue_len: 16,
        }
    }
}

impl SchedulerConfig {
    fn validate(&self) -> Result<()> {
        if self.max_triggers_per_second == 0 {
            return invalid("max_triggers_per_second must be at least 1");
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Failures within the active window that trip a downgrade.
    pub failure_threshold: u32,
    /// Quiet time required before quality climbs one step.
    pub recovery_secs: f64,
    /// Cadence of the recovery probe.
    pub probe_interval_secs: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_secs: 10.0,
            probe_interval_secs: 5.0,
        }
    }
}

impl BreakerConfig {
    fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return invalid("failure_threshold must be at least 1");
        }
        if !(self.recovery_secs > 0.0 && self.probe_interval_secs > 0.0) {
            return invalid("breaker timings must be positive");
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub low_capacity: usize,
    pub medium_capacity: usize,
    pub high_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            low_capacity: 8,
            medium_capacity: 16,
            high_capacity: 32,
        }
    }
}

impl PoolConfig {
    fn validate(&self) -> Result<()> {
        if self.low_capacity == 0 {
            return invalid("pool capacities must be non-zero");
        }
        if self.low_capacity > self.medium_capacity || self.medium_capacity > self.high_capacity {
            return invalid("pool capacities must grow with quality");
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Silence kept after the release reaches zero before the slot is freed.
    pub guard_ms: f32,
    /// Lowpass cutoff for discrete voices when the filter is enabled.
    pub filter_cutoff_hz: f32,
    /// Drive used by the per-voice saturation stage.
    pub drive: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            guard_ms: 20.0,
            filter_cutoff_hz: 3_500.0,
            drive: 1.6,
        }
    }
}

impl VoiceConfig {
    fn validate(&self) -> Result<()> {
        if !(self.guard_ms >= MIN_GUARD_MS) {
            return invalid(format!("guard margin must be at least {MIN_GUARD_MS}ms"));
        }
        if !(self.filter_cutoff_hz > 20.0) {
            return invalid("filter cutoff must be above 20Hz");
        }
        if !(self.drive >= 1.0) {
            return invalid("drive must be >= 1.0");
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousConfig {
    /// Time constant for parameter drift while sustaining.
    pub smoothing_ms: f32,
    /// Fade in from silence.
    pub fade_in_ms: f32,
    /// Fade to silence when the pointer leaves.
    pub fade_out_ms: f32,
    /// Level used when a retarget arrives on a silent channel.
    pub default_amplitude: f32,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            smoothing_ms: 30.0,
            fade_in_ms: 40.0,
            fade_out_ms: 120.0,
            default_amplitude: 0.25,
        }
    }
}

impl ContinuousConfig {
    fn validate(&self) -> Result<()> {
        if !(self.smoothing_ms > 0.0 && self.fade_in_ms > 0.0 && self.fade_out_ms > 0.0) {
            return invalid("continuous timings must be positive");
        }
        if !(0.0..=1.0).contains(&self.default_amplitude) {
            return invalid("default amplitude must be within 0..=1");
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MixConfig {
    pub master_volume: f32,
    pub reverb_send: f32,
    pub reverb_room_size: f32,
    pub reverb_damping: f32,
    pub delay_send: f32,
    pub delay_ms: f32,
    pub delay_feedback: f32,
    pub compressor_threshold_db: f32,
    pub compressor_ratio: f32,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            reverb_send: 0.18,
            reverb_room_size: 0.5,
            reverb_damping: 0.4,
            delay_send: 0.12,
            delay_ms: 180.0,
            delay_feedback: 0.3,
            compressor_threshold_db: -12.0,
            compressor_ratio: 4.0,
        }
    }
}

impl MixConfig {
    fn validate(&self) -> Result<()> {
        let unit = [
            ("master_volume", self.master_volume),
            ("reverb_send", self.reverb_send),
            ("reverb_room_size", self.reverb_room_size),
            ("reverb_damping", self.reverb_damping),
            ("delay_send", self.delay_send),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be within 0..=1"));
            }
        }
        if !(0.0..0.95).contains(&self.delay_feedback) {
            return invalid("delay feedback must be within 0..0.95");
        }
        if !(self.delay_ms > 0.0 && self.compressor_ratio >= 1.0) {
            return invalid("delay time must be positive and ratio >= 1");
        }
        Ok(())
    }
}

fn invalid<T>(msg: impl Into<String>) -> Result<T> {
    Err(EngineError::InvalidConfig(msg.into()))
}
