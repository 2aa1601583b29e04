//! Quality tiers and the synthesis budget each one allows.
//!
//! The circuit breaker is the only writer of the current [`QualityLevel`];
//! everything else receives it by value and looks up a [`QualityProfile`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

impl QualityLevel {
    /// One step down, floored at `Low`.
    pub fn lower(self) -> Self {
        match self {
            QualityLevel::High => QualityLevel::Medium,
            QualityLevel::Medium | QualityLevel::Low => QualityLevel::Low,
        }
    }

    /// One step up, capped at `High`.
    pub fn raise(self) -> Self {
        match self {
            QualityLevel::Low => QualityLevel::Medium,
            QualityLevel::Medium | QualityLevel::High => QualityLevel::High,
        }
    }

    pub fn profile(self) -> QualityProfile {
        QualityProfile::for_level(self)
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        QualityLevel::High
    }
}

/// What a voice is allowed to cost at a given quality level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    /// Oscillators layered inside one voice (detuned unison above 1).
    pub oscillators_per_voice: usize,
    /// Restrict timbres to sine/triangle.
    pub simple_waveforms: bool,
    /// Per-voice lowpass filter.
    pub voice_filter: bool,
    /// Per-voice soft saturation.
    pub voice_drive: bool,
    /// Voices rendered for a chord event.
    pub chord_voices: usize,
    /// Continuous-channel crossfade window.
    pub crossfade_ms: f32,
    pub reverb_send: bool,
    pub delay_send: bool,
}

impl QualityProfile {
    pub fn for_level(level: QualityLevel) -> Self {
        match level {
            QualityLevel::High => Self {
                oscillators_per_voice: 2,
                simple_waveforms: false,
                voice_filter: true,
                voice_drive: true,
                chord_voices: 3,
                crossfade_ms: 200.0,
                reverb_send: true,
                delay_send: true,
            },
            QualityLevel::Medium => Self {
                oscillators_per_voice: 1,
                simple_waveforms: false,
                voice_filter: true,
                voice_drive: false,
                chord_voices: 3,
                crossfade_ms: 150.0,
                reverb_send: true,
                delay_send: false,
            },
            QualityLevel::Low => Self {
                oscillators_per_voice: 1,
                simple_waveforms: true,
                voice_filter: false,
                voice_drive: false,
                chord_voices: 2,
                crossfade_ms: 100.0,
                reverb_send: false,
                delay_send: false,
            },
        }
    }
}

/// Pool capacity for a level, taken from the configured tiers.
pub fn capacity_for(level: QualityLevel, pool: &PoolConfig) -> usize {
    match level {
        QualityLevel::Low => pool.low_capacity,
        QualityLevel::Medium => pool.medium_capacity,
        QualityLevel::High => pool.high_capacity,
    }
}
