//! Failure-counting circuit breaker that owns the quality level.
//!
//! Immediate drop, slow climb:
//!
//! ```text
//!            failures ≥ threshold            failures ≥ threshold
//!   Healthy ───────────────────→ Degraded ─────────────────────→ Degraded
//!   (High)        quality - 1    (Medium)        quality - 1      (Low)
//!      ↑                            │
//!      └────── quiet ≥ recovery ────┘  quality + 1 per quiet period
//! ```
//!
//! The recovery probe runs every `probe_interval_secs`, re-armed by each
//! failure, and is driven cooperatively through [`CircuitBreaker::poll`]. A
//! probe raises quality by one step only when no failure (and no earlier step
//! up) happened within the last `recovery_secs`, so climbing back from `Low`
//! takes two full quiet periods.

use tracing::info;

use crate::{config::BreakerConfig, quality::QualityLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FailureRecord {
    pub count: u32,
    pub last_failure_at: Option<f64>,
}

pub struct CircuitBreaker {
    config: BreakerConfig,
    state: BreakerState,
    quality: QualityLevel,
    ceiling: QualityLevel,
    record: FailureRecord,
    next_probe_at: Option<f64>,
    last_step_up_at: Option<f64>,
}

impl CircuitBreaker {
    /// `ceiling` is both the starting level and the highest level recovery
    /// will climb back to.
    pub fn new(config: &BreakerConfig, ceiling: QualityLevel) -> Self {
        Self {
            config: config.clone(),
            state: BreakerState::Healthy,
            quality: ceiling,
            ceiling,
            record: FailureRecord::default(),
            next_probe_at: None,
            last_step_up_at: None,
        }
    }

    /// Count one failure at `now`. Returns the new level if this failure
    /// tripped a downgrade.
    pub fn record_failure(&mut self, now: f64) -> Option<QualityLevel> {
        self.record.count += 1;
        self.record.last_failure_at = Some(now);
        self.next_probe_at = Some(now + self.config.probe_interval_secs);

        if self.record.count < self.config.failure_threshold {
            return None;
        }

        self.record.count = 0;
        self.state = BreakerState::Degraded;
        let before = self.quality;
        self.quality = before.lower();
        info!(from = ?before, to = ?self.quality, "failure threshold reached, degrading quality");
        (self.quality != before).then_some(self.quality)
    }

    /// Run every recovery probe that is due by `now`. Returns the new level if
    /// quality changed.
    pub fn poll(&mut self, now: f64) -> Option<QualityLevel> {
        let before = self.quality;

        while let Some(due) = self.next_probe_at {
            if now < due {
                break;
            }
            self.probe(due);
            self.next_probe_at = if self.state == BreakerState::Healthy && self.record.count == 0 {
                None
            } else {
                Some(due + self.config.probe_interval_secs)
            };
        }

        (self.quality != before).then_some(self.quality)
    }

    fn probe(&mut self, at: f64) {
        let quiet_since = match (self.record.last_failure_at, self.last_step_up_at) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return,
        };
        if at - quiet_since < self.config.recovery_secs {
            return;
        }

        self.record.count = 0;
        if self.state == BreakerState::Degraded {
            let before = self.quality;
            self.quality = before.raise().min(self.ceiling);
            self.last_step_up_at = Some(at);
            if self.quality == self.ceiling {
                self.state = BreakerState::Healthy;
            }
            info!(from = ?before, to = ?self.quality, state = ?self.state, "quiet period elapsed, raising quality");
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.state == BreakerState::Degraded
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn current_quality_level(&self) -> QualityLevel {
        self.quality
    }

    pub fn failure_count(&self) -> u32 {
        self.record.count
    }

    pub fn record(&self) -> FailureRecord {
        self.record
    }
}
