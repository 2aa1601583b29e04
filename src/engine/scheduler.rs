//! Trigger admission control.
//!
//! A raw pointer stream fires far more often than anything should be heard.
//! The scheduler decides per trigger whether it reaches a voice:
//!
//! - Click, Release, ModeToggle and Leave are always forwarded.
//! - FacetEnter is forwarded only when it names a different facet than the
//!   last forwarded one; repeats of the same facet are dropped.
//! - PositionalMove is forwarded at most `max_triggers_per_second` times per
//!   rolling second and never closer together than `1 / max` seconds. Only
//!   moves space moves; entering a facet does not hold back the first move.
//! - In continuous mode both positional kinds pass unconditionally; the
//!   continuous voice engine smooths and coalesces them itself.
//!
//! Every forwarded trigger counts toward the window.

use tracing::trace;

use crate::{
    config::SchedulerConfig,
    io::event::{TriggerEvent, TriggerKind},
};

const WINDOW_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Forward,
    Drop,
}

/// Rolling one-second counter plus the continuous-mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchedulerWindow {
    started_at: Option<f64>,
    count: u32,
    continuous: bool,
}

impl SchedulerWindow {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Start a fresh window once the current one is a full second old.
    fn roll(&mut self, now: f64) {
        match self.started_at {
            Some(start) if now - start < WINDOW_SECS => {}
            _ => {
                self.started_at = Some(now);
                self.count = 0;
            }
        }
    }
}

pub struct TriggerScheduler {
    window: SchedulerWindow,
    max_per_second: u32,
    min_spacing: f64,
    last_move_at: Option<f64>,
    last_forwarded_facet: Option<u32>,
    hovered_facet: Option<u32>,
}

impl TriggerScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        let max_per_second = config.max_triggers_per_second.max(1);
        Self {
            window: SchedulerWindow::default(),
            max_per_second,
            min_spacing: WINDOW_SECS / max_per_second as f64,
            last_move_at: None,
            last_forwarded_facet: None,
            hovered_facet: None,
        }
    }

    pub fn admit(&mut self, event: &TriggerEvent) -> Admission {
        let now = event.timestamp;
        self.window.roll(now);

        let decision = match &event.kind {
            kind if kind.is_discrete() => {
                if matches!(kind, TriggerKind::Leave) {
                    self.hovered_facet = None;
                    self.last_forwarded_facet = None;
                }
                Admission::Forward
            }
            TriggerKind::FacetEnter { facet, .. } => {
                self.hovered_facet = Some(*facet);
                if self.window.continuous || self.last_forwarded_facet != Some(*facet) {
                    self.last_forwarded_facet = Some(*facet);
                    Admission::Forward
                } else {
                    Admission::Drop
                }
            }
            TriggerKind::PositionalMove { .. } => {
                if self.window.continuous {
                    Admission::Forward
                } else if self.hovered_facet.is_some() && self.has_room(now) {
                    self.last_move_at = Some(now);
                    Admission::Forward
                } else {
                    Admission::Drop
                }
            }
            _ => Admission::Drop,
        };

        if decision == Admission::Forward {
            self.window.count = self.window.count.saturating_add(1);
        }
        trace!(?decision, count = self.window.count, kind = ?event.kind, "trigger admission");
        decision
    }

    fn has_room(&self, now: f64) -> bool {
        let spaced = self
            .last_move_at
            .map_or(true, |last| now - last >= self.min_spacing || now < last);
        spaced && self.window.count < self.max_per_second
    }

    pub fn set_continuous_mode(&mut self, enabled: bool) {
        self.window.continuous = enabled;
    }

    pub fn is_continuous(&self) -> bool {
        self.window.continuous
    }

    pub fn window(&self) -> &SchedulerWindow {
        &self.window
    }

    /// Facet the pointer is currently over, as last reported.
    pub fn hovered_facet(&self) -> Option<u32> {
        self.hovered_facet
    }
}
