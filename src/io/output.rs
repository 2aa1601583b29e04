//! Default-device output through cpal.
//!
//! The engine moves into the device callback. Control messages reach it over
//! one rtrb ring, status snapshots come back over another, so neither side
//! ever waits on the other.
//!
//! Both sides share one clock started by [`CpalOutput::start`]. Stamp
//! triggers with [`CpalOutput::now`]; the callback advances the engine to the
//! same clock every block, so degraded quality recovers while the pointer is
//! idle.

use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info};

use crate::{
    config::EngineConfig,
    engine::{Engine, EngineStatus},
    error::{EngineError, Result},
    io::{
        event::TriggerEvent,
        message::{ControlMessage, MessageSender},
    },
    MAX_BLOCK_SIZE,
};

const CONTROL_QUEUE: usize = 1024;
const STATUS_QUEUE: usize = 64;

pub struct CpalOutput {
    _stream: cpal::Stream,
    controls: Producer<ControlMessage>,
    status: Consumer<EngineStatus>,
    clock: Instant,
    sample_rate: f32,
    channels: usize,
}

impl CpalOutput {
    /// Open the default output device and start rendering. Any failure here
    /// is `DeviceUnavailable`: the caller should run without sound.
    pub fn start(config: EngineConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| unavailable("no default output device"))?;
        let supported = device
            .default_output_config()
            .map_err(|err| unavailable(format!("no output config: {err}")))?;
        if supported.sample_format() != SampleFormat::F32 {
            return Err(unavailable(format!(
                "unsupported sample format {:?}",
                supported.sample_format()
            )));
        }

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        let stream_config: cpal::StreamConfig = supported.into();

        let mut engine = Engine::new(config.with_sample_rate(sample_rate))?;
        engine.resume();

        let (controls, mut control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_QUEUE);
        let (mut status_tx, status) = RingBuffer::<EngineStatus>::new(STATUS_QUEUE);
        let mut mono = vec![0.0_f32; MAX_BLOCK_SIZE];
        let clock = Instant::now();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    engine.drain_messages(&mut control_rx);
                    let now = clock.elapsed().as_secs_f64();

                    for frames in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                        let block = &mut mono[..frames.len() / channels];
                        engine.render_block_at(now, block);
                        for (frame, sample) in frames.chunks_mut(channels).zip(block.iter()) {
                            frame.fill(*sample);
                        }
                    }

                    // A full status ring just means nobody is reading.
                    let _ = status_tx.push(engine.status());
                },
                |err| error!(%err, "output stream error"),
                None,
            )
            .map_err(|err| unavailable(format!("failed to build stream: {err}")))?;
        stream
            .play()
            .map_err(|err| unavailable(format!("failed to start stream: {err}")))?;

        info!(sample_rate, channels, "audio output started");
        Ok(Self {
            _stream: stream,
            controls,
            status,
            clock,
            sample_rate,
            channels,
        })
    }

    /// Hand a message to the audio thread. Returns `false` if the queue is
    /// full and the message was dropped.
    pub fn send(&mut self, msg: ControlMessage) -> bool {
        MessageSender::push(&mut self.controls, msg).is_ok()
    }

    /// Seconds since the stream started, on the clock the engine follows.
    pub fn now(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    pub fn trigger(&mut self, event: TriggerEvent) -> bool {
        self.send(ControlMessage::Trigger(event))
    }

    /// Most recent snapshot published by the audio thread.
    pub fn latest_status(&mut self) -> Option<EngineStatus> {
        let mut latest = None;
        while let Ok(status) = self.status.pop() {
            latest = Some(status);
        }
        latest
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

fn unavailable(reason: impl Into<String>) -> EngineError {
    let reason = reason.into();
    error!(%reason, "audio output unavailable");
    EngineError::DeviceUnavailable(reason)
}
