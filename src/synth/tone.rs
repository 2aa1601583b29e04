//! Discrete one-shot tones.
//!
//! Every tone leases a [`VoiceUnit`] from the pool, plays a linear attack and
//! an exponential release, and hands the slot back once the render clock
//! passes its stop time. The stop time is fixed when the tone starts:
//!
//! ```text
//!   created ──attack──┬──hold──┬──────release──────┬──guard──┐
//!                     peak     release starts      level = 0  stop_at
//! ```
//!
//! Retirement is checked at the end of each rendered block, so a slot is
//! never returned while its envelope can still be heard. Forced cleanup
//! (downgrade, panic) releases slots immediately, oldest voice first.

use tracing::debug;

use crate::{
    config::VoiceConfig,
    dsp::oscillator::Waveform,
    engine::pool::SignalNodePool,
    error::{EngineError, Result},
    quality::QualityLevel,
    synth::{
        timbre,
        voice::{Voice, VoiceHandle, VoiceId, VoiceSpec, VoiceStage, VoiceUnit},
    },
};

/// Voices in the largest chord.
pub const MAX_CHORD_VOICES: usize = timbre::CHORD_RATIOS.len();

/// Handles for the voices one chord started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChordHandle {
    pub voices: [Option<VoiceHandle>; MAX_CHORD_VOICES],
}

impl ChordHandle {
    pub fn len(&self) -> usize {
        self.voices.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ToneSynthesizer {
    voices: Vec<Voice>,
    next_id: VoiceId,
    frames: u64,
    sample_rate: f32,
    config: VoiceConfig,
}

impl ToneSynthesizer {
    /// `max_voices` should be the pool's physical size so tracking never
    /// reallocates.
    pub fn new(config: &VoiceConfig, sample_rate: f32, max_voices: usize) -> Self {
        Self {
            voices: Vec::with_capacity(max_voices),
            next_id: 1,
            frames: 0,
            sample_rate,
            config: config.clone(),
        }
    }

    /// Render-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn render_discrete(
        &mut self,
        pool: &mut SignalNodePool<VoiceUnit>,
        spec: &VoiceSpec,
        quality: QualityLevel,
    ) -> Result<VoiceHandle> {
        spec.validate()?;
        let slot = pool.lease()?;
        let Some(unit) = pool.get_mut(slot) else {
            pool.release(slot);
            return Err(EngineError::PoolExhausted {
                capacity: pool.capacity(),
            });
        };

        let profile = quality.profile();
        unit.start(spec, &profile, &self.config);

        let created_at = self.now();
        let lifetime = unit.one_shot_samples() as f64 / self.sample_rate as f64
            + self.config.guard_ms as f64 / 1000.0;
        let waveform = if profile.simple_waveforms {
            spec.waveform.simplified()
        } else {
            spec.waveform
        };

        let voice = Voice {
            id: self.next_id,
            waveform,
            base_frequency: spec.base_frequency,
            detune_cents: spec.detune_cents,
            stage: unit.stage(),
            created_at,
            stop_at: created_at + lifetime,
            slot: Some(slot),
        };
        self.next_id += 1;
        self.voices.push(voice);
        Ok(voice.handle())
    }

    pub fn render_click(
        &mut self,
        pool: &mut SignalNodePool<VoiceUnit>,
        quality: QualityLevel,
    ) -> Result<VoiceHandle> {
        self.render_discrete(pool, &timbre::click_voice(), quality)
    }

    pub fn render_release(
        &mut self,
        pool: &mut SignalNodePool<VoiceUnit>,
        quality: QualityLevel,
    ) -> Result<VoiceHandle> {
        self.render_discrete(pool, &timbre::release_voice(), quality)
    }

    pub fn render_facet(
        &mut self,
        pool: &mut SignalNodePool<VoiceUnit>,
        facet: u32,
        u: f32,
        v: f32,
        quality: QualityLevel,
    ) -> Result<VoiceHandle> {
        self.render_discrete(pool, &timbre::facet_voice(facet, u, v), quality)
    }

    /// Start up to three voices at unison, major third and fifth above
    /// `root`. The chord shrinks with quality. If the pool runs dry midway
    /// the voices already started keep playing and the error is returned.
    pub fn render_chord(
        &mut self,
        pool: &mut SignalNodePool<VoiceUnit>,
        root: f32,
        waveform: Waveform,
        quality: QualityLevel,
    ) -> Result<ChordHandle> {
        let size = quality.profile().chord_voices.clamp(1, MAX_CHORD_VOICES);
        let mut chord = ChordHandle::default();
        for (slot, ratio) in chord.voices.iter_mut().zip(timbre::CHORD_RATIOS).take(size) {
            let spec = timbre::chord_voice(waveform, root * ratio);
            *slot = Some(self.render_discrete(pool, &spec, quality)?);
        }
        Ok(chord)
    }

    /// Add every live voice into `out`, advance the clock, then hand back the
    /// slots of voices past their stop time.
    pub fn render_block(&mut self, pool: &mut SignalNodePool<VoiceUnit>, out: &mut [f32]) {
        for voice in &mut self.voices {
            let Some(slot) = voice.slot else {
                continue;
            };
            let Some(unit) = pool.get_mut(slot) else {
                continue;
            };
            unit.render_add(out);
            voice.stage = unit.stage();
        }

        self.frames += out.len() as u64;
        let now = self.now();
        self.voices.retain(|voice| {
            if now < voice.stop_at {
                return true;
            }
            if let Some(slot) = voice.slot {
                pool.release(slot);
            }
            false
        });
    }

    /// Cut the `count` oldest voices and return their slots. Returns how many
    /// were retired.
    pub fn retire_oldest(&mut self, pool: &mut SignalNodePool<VoiceUnit>, count: usize) -> usize {
        let count = count.min(self.voices.len());
        for voice in self.voices.drain(..count) {
            if let Some(slot) = voice.slot {
                if let Some(unit) = pool.get_mut(slot) {
                    unit.silence();
                }
                pool.release(slot);
            }
        }
        if count > 0 {
            debug!(count, remaining = self.voices.len(), "retired voices early");
        }
        count
    }

    /// All sound off.
    pub fn panic(&mut self, pool: &mut SignalNodePool<VoiceUnit>) -> usize {
        let count = self.voices.len();
        self.retire_oldest(pool, count)
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.id == id)
    }

    /// Voices whose envelope has not yet reached zero.
    pub fn sounding_count(&self) -> usize {
        self.voices
            .iter()
            .filter(|voice| voice.stage != VoiceStage::Idle)
            .count()
    }
}
