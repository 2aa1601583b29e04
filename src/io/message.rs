#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::io::event::TriggerEvent;

/// Control traffic from the input thread to whoever owns the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    Trigger(TriggerEvent),
    SetMasterVolume(f32),
    SetMuted(bool),
    SetContinuousMode(bool),
    /// Input-clock heartbeat; drives the breaker's recovery probe.
    Tick(f64),
    Resume,
    Suspend,
    /// All sound off.
    Panic,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Anything a message can be pushed into without blocking.
pub trait MessageSender {
    /// Hands the message back when the queue is full.
    fn push(&mut self, msg: ControlMessage) -> Result<(), ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageSender for Producer<ControlMessage> {
    fn push(&mut self, msg: ControlMessage) -> Result<(), ControlMessage> {
        Producer::push(self, msg).map_err(|rtrb::PushError::Full(msg)| msg)
    }
}
