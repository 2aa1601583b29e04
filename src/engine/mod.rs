//! Control plane: the [`Engine`] facade and the components it owns.
//!
//! Each component owns one slice of state and nothing else writes it:
//!
//! | state                 | owner               |
//! |-----------------------|---------------------|
//! | rate window, hover    | `TriggerScheduler`  |
//! | quality, failures     | `CircuitBreaker`    |
//! | slot leases           | `SignalNodePool`    |
//! | discrete voices       | `ToneSynthesizer`   |
//! | hover channel         | `ContinuousVoiceEngine` |
//! | master gain, sends    | `MixBus`            |
//!
//! The engine only routes between them. Everything runs on whichever thread
//! owns the `Engine`; nothing here blocks or allocates after construction.

pub mod breaker;
pub mod bus;
pub mod pool;
pub mod scheduler;

use std::collections::VecDeque;

use tracing::{error, info, warn};

use self::{
    breaker::{BreakerState, CircuitBreaker},
    bus::MixBus,
    pool::SignalNodePool,
    scheduler::{Admission, TriggerScheduler},
};
use crate::{
    config::EngineConfig,
    error::{EngineError, Result},
    io::{
        event::{TriggerEvent, TriggerKind},
        message::{ControlMessage, MessageReceiver},
    },
    quality::QualityLevel,
    synth::{
        timbre, ContinuousState, ContinuousVoiceEngine, ToneSynthesizer, VoiceUnit,
    },
    MAX_BLOCK_SIZE,
};

/// Output device lifecycle as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Not yet allowed to render. Triggers are queued.
    Suspended,
    Running,
    /// Device unavailable. Permanently silent.
    Closed,
}

/// Diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    pub quality: QualityLevel,
    pub active_voices: usize,
    pub context_state: ContextState,
    pub failure_count: u32,
    pub breaker_state: BreakerState,
    pub continuous_state: ContinuousState,
    pub master_volume: f32,
    pub muted: bool,
}

pub struct Engine {
    config: EngineConfig,
    context: ContextState,
    scheduler: TriggerScheduler,
    breaker: CircuitBreaker,
    pool: SignalNodePool<VoiceUnit>,
    tones: ToneSynthesizer,
    continuous: ContinuousVoiceEngine,
    bus: MixBus,
    suspended_queue: VecDeque<TriggerEvent>,
    /// Latest input-clock time seen.
    now: f64,
}

impl Engine {
    /// Build every component up front. The engine starts `Suspended`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let sr = config.sample_rate;
        let quality = config.initial_quality;

        let pool = SignalNodePool::new(&config.pool, quality, || VoiceUnit::new(sr));
        Ok(Self {
            context: ContextState::Suspended,
            scheduler: TriggerScheduler::new(&config.scheduler),
            breaker: CircuitBreaker::new(&config.breaker, quality),
            tones: ToneSynthesizer::new(&config.voice, sr, config.pool.high_capacity),
            continuous: ContinuousVoiceEngine::new(&config.continuous, sr, quality),
            bus: MixBus::new(&config.mix, sr),
            suspended_queue: VecDeque::with_capacity(config.scheduler.suspended_queue_len),
            pool,
            now: 0.0,
            config,
        })
    }

    /// Feed one pointer-layer event. Never blocks, never fails: anything that
    /// cannot be played is dropped and, if transient, counted by the breaker.
    pub fn trigger(&mut self, event: TriggerEvent) {
        if self.context == ContextState::Closed {
            return;
        }
        self.tick(event.timestamp);

        if self.scheduler.admit(&event) == Admission::Drop {
            return;
        }

        if self.context == ContextState::Suspended {
            if self.suspended_queue.len() < self.config.scheduler.suspended_queue_len {
                self.suspended_queue.push_back(event);
            } else {
                warn!(queued = self.suspended_queue.len(), "device suspended, dropping trigger");
                self.fail(EngineError::DeviceSuspended);
            }
            return;
        }

        self.dispatch(event);
    }

    fn dispatch(&mut self, event: TriggerEvent) {
        let quality = self.quality();
        let result = match event.kind {
            TriggerKind::Click => self.tones.render_click(&mut self.pool, quality).map(drop),
            TriggerKind::Release => self.tones.render_release(&mut self.pool, quality).map(drop),
            TriggerKind::FacetEnter { facet, u, v } => {
                if self.scheduler.is_continuous() {
                    let (frequency, detune) = timbre::facet_pitch(facet, u, v);
                    self.continuous.retarget(frequency, detune);
                    Ok(())
                } else {
                    self.tones
                        .render_facet(&mut self.pool, facet, u, v, quality)
                        .map(drop)
                }
            }
            TriggerKind::PositionalMove { x, y } => match self.scheduler.hovered_facet() {
                Some(facet) if self.scheduler.is_continuous() => {
                    let (frequency, detune) =
                        timbre::facet_pitch(facet, (x + 1.0) * 0.5, (y + 1.0) * 0.5);
                    let amplitude = self.config.continuous.default_amplitude;
                    self.continuous.update_target(frequency, detune, amplitude);
                    Ok(())
                }
                Some(facet) => {
                    let spec = timbre::hover_voice(facet, x, y);
                    self.tones
                        .render_discrete(&mut self.pool, &spec, quality)
                        .map(drop)
                }
                None => Ok(()),
            },
            TriggerKind::ModeToggle { name, active } => {
                let root = timbre::mode_root(active);
                let waveform = timbre::mode_waveform(name.as_str());
                self.tones
                    .render_chord(&mut self.pool, root, waveform, quality)
                    .map(drop)
            }
            TriggerKind::Leave => {
                self.continuous.silence();
                Ok(())
            }
        };

        if let Err(err) = result {
            self.fail(err);
        }
    }

    /// Route a failure: transient ones go to the breaker, the rest are
    /// dropped with a log line.
    fn fail(&mut self, err: EngineError) {
        if err.is_transient() {
            if let Some(level) = self.breaker.record_failure(self.now) {
                self.apply_quality(level);
            }
        } else {
            warn!(%err, "trigger dropped");
        }
    }

    fn apply_quality(&mut self, level: QualityLevel) {
        let excess = self.pool.set_quality(level);
        self.tones.retire_oldest(&mut self.pool, excess);
        self.continuous.set_quality(level);
    }

    /// Advance the input clock and run any due recovery probe.
    pub fn tick(&mut self, now: f64) {
        if now.is_finite() && now > self.now {
            self.now = now;
        }
        if let Some(level) = self.breaker.poll(self.now) {
            self.apply_quality(level);
        }
    }

    /// Fill `out` with mono output. Silent unless `Running`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if self.context != ContextState::Running {
            return;
        }
        let quality = self.quality();
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.tones.render_block(&mut self.pool, chunk);
            self.continuous.render_block(chunk);
            self.bus.render(chunk, quality);
        }
    }

    /// Advance the input clock to `now`, then render. For hosts whose render
    /// callback can read the input layer's clock, so recovery keeps running
    /// while no triggers arrive.
    pub fn render_block_at(&mut self, now: f64, out: &mut [f32]) {
        self.tick(now);
        self.render_block(out);
    }

    /// The device may render now. Queued triggers play in arrival order.
    pub fn resume(&mut self) {
        if self.context != ContextState::Suspended {
            return;
        }
        self.context = ContextState::Running;
        info!(queued = self.suspended_queue.len(), "audio context running");
        while let Some(event) = self.suspended_queue.pop_front() {
            self.dispatch(event);
        }
    }

    pub fn suspend(&mut self) {
        if self.context == ContextState::Running {
            self.context = ContextState::Suspended;
            info!("audio context suspended");
        }
    }

    /// Declare the output device gone. Everything is released and the engine
    /// becomes a silent no-op. Returns the error to surface to the caller.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) -> EngineError {
        let reason = reason.into();
        if self.context != ContextState::Closed {
            error!(%reason, "audio output unavailable, engine disabled");
            self.context = ContextState::Closed;
            self.tones.panic(&mut self.pool);
            self.continuous.reset();
            self.bus.reset();
            self.suspended_queue.clear();
        }
        EngineError::DeviceUnavailable(reason)
    }

    /// All sound off: discrete voices are cut, the hover channel fades out.
    pub fn panic(&mut self) {
        self.tones.panic(&mut self.pool);
        self.continuous.silence();
        self.suspended_queue.clear();
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.bus.set_master_volume(volume);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.bus.set_muted(muted);
    }

    /// Leaving continuous mode fades the hover channel out.
    pub fn set_continuous_mode(&mut self, enabled: bool) {
        self.scheduler.set_continuous_mode(enabled);
        if !enabled {
            self.continuous.silence();
        }
    }

    pub fn handle(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::Trigger(event) => self.trigger(event),
            ControlMessage::SetMasterVolume(volume) => self.set_master_volume(volume),
            ControlMessage::SetMuted(muted) => self.set_muted(muted),
            ControlMessage::SetContinuousMode(enabled) => self.set_continuous_mode(enabled),
            ControlMessage::Tick(now) => self.tick(now),
            ControlMessage::Resume => self.resume(),
            ControlMessage::Suspend => self.suspend(),
            ControlMessage::Panic => self.panic(),
        }
    }

    /// Apply every message waiting in `rx`.
    pub fn drain_messages<R: MessageReceiver>(&mut self, rx: &mut R) {
        while let Some(msg) = rx.pop() {
            self.handle(msg);
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            quality: self.quality(),
            active_voices: self.pool.leased(),
            context_state: self.context,
            failure_count: self.breaker.failure_count(),
            breaker_state: self.breaker.state(),
            continuous_state: self.continuous.state(),
            master_volume: self.bus.master_volume(),
            muted: self.bus.is_muted(),
        }
    }

    pub fn quality(&self) -> QualityLevel {
        self.breaker.current_quality_level()
    }

    pub fn context_state(&self) -> ContextState {
        self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &SignalNodePool<VoiceUnit> {
        &self.pool
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn scheduler(&self) -> &TriggerScheduler {
        &self.scheduler
    }

    pub fn tones(&self) -> &ToneSynthesizer {
        &self.tones
    }

    pub fn continuous(&self) -> &ContinuousVoiceEngine {
        &self.continuous
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.resume();
        engine
    }

    #[test]
    fn starts_suspended_and_silent() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.context_state(), ContextState::Suspended);
        engine.trigger(TriggerEvent::press(0.0));

        let mut out = [1.0; 256];
        engine.render_block(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(engine.status().active_voices, 0);
    }

    #[test]
    fn resume_flushes_queued_triggers() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.trigger(TriggerEvent::press(0.0));
        engine.trigger(TriggerEvent::release(0.05));
        engine.resume();
        assert_eq!(engine.status().active_voices, 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.breaker.failure_threshold = 0;
        assert!(matches!(Engine::new(config), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn mode_toggle_plays_a_chord() {
        let mut engine = running();
        engine.trigger(TriggerEvent::mode_toggle("rainbow", true, 0.0));
        assert_eq!(engine.status().active_voices, 3);
    }

    #[test]
    fn continuous_mode_routes_to_the_hover_channel() {
        let mut engine = running();
        engine.set_continuous_mode(true);
        engine.trigger(TriggerEvent::pointer_enter(4, 0.5, 0.5, 0.0));
        engine.trigger(TriggerEvent::pointer_move(0.2, -0.1, 0.01));

        let status = engine.status();
        assert_eq!(status.active_voices, 0, "hover channel does not use the pool");
        assert_eq!(status.continuous_state, ContinuousState::Sustaining);

        engine.trigger(TriggerEvent::leave(0.02));
        assert_eq!(engine.status().continuous_state, ContinuousState::Silent);
    }

    #[test]
    fn panic_frees_every_slot() {
        let mut engine = running();
        for i in 0..10 {
            engine.trigger(TriggerEvent::press(i as f64 * 0.001));
        }
        assert_eq!(engine.status().active_voices, 10);
        engine.panic();
        assert_eq!(engine.status().active_voices, 0);
    }

    #[test]
    fn rendering_alone_lets_quality_recover() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        for i in 0..21 {
            engine.trigger(TriggerEvent::press(i as f64 * 0.001));
        }
        assert_eq!(engine.quality(), QualityLevel::Medium);
        engine.resume();

        let mut out = [0.0; 256];
        engine.render_block_at(2.0, &mut out);
        assert_eq!(engine.quality(), QualityLevel::Medium, "too early to recover");

        engine.render_block_at(20.0, &mut out);
        let status = engine.status();
        assert_eq!(status.quality, QualityLevel::High);
        assert_eq!(status.breaker_state, BreakerState::Healthy);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn drains_control_messages() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let (mut tx, mut rx) = rtrb::RingBuffer::<ControlMessage>::new(8);
        tx.push(ControlMessage::Resume).unwrap();
        tx.push(ControlMessage::Trigger(TriggerEvent::press(0.0))).unwrap();
        tx.push(ControlMessage::SetMuted(true)).unwrap();

        engine.drain_messages(&mut rx);
        let status = engine.status();
        assert_eq!(status.context_state, ContextState::Running);
        assert_eq!(status.active_voices, 1);
        assert!(status.muted);
    }

    #[test]
    fn status_reflects_volume_and_mute() {
        let mut engine = running();
        engine.set_master_volume(0.25);
        engine.set_muted(true);
        let status = engine.status();
        assert_eq!(status.master_volume, 0.25);
        assert!(status.muted);
        assert_eq!(status.quality, QualityLevel::High);
        assert_eq!(status.breaker_state, BreakerState::Healthy);
    }
}
