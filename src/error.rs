/// Result alias that carries the crate-wide [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every failure the engine can report.
///
/// Only [`EngineError::DeviceUnavailable`] is meant to reach the presentation
/// layer. The transient variants are recovered inside the engine and fed to
/// the circuit breaker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The audio output device could not be created. Fatal for the session.
    #[error("audio output device unavailable: {0}")]
    DeviceUnavailable(String),
    /// No free slot in the signal node pool.
    #[error("signal node pool exhausted ({capacity} slots leased)")]
    PoolExhausted { capacity: usize },
    /// A voice spec with a malformed envelope or pitch.
    #[error("invalid voice envelope: {0}")]
    EnvelopeScheduling(String),
    /// The device is not rendering yet and the pending queue is full.
    #[error("output device suspended and trigger queue is full")]
    DeviceSuspended,
    /// Rejected by [`crate::config::EngineConfig::validate`].
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Transient failures are dropped locally and counted by the breaker.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::PoolExhausted { .. } | EngineError::DeviceSuspended
        )
    }
}

/// Returned by [`crate::engine::pool::SignalNodePool::lease`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no free pool slot (capacity {capacity})")]
pub struct PoolExhausted {
    pub capacity: usize,
}

impl From<PoolExhausted> for EngineError {
    fn from(err: PoolExhausted) -> Self {
        EngineError::PoolExhausted {
            capacity: err.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_converts_and_is_transient() {
        let err: EngineError = PoolExhausted { capacity: 8 }.into();
        assert_eq!(err, EngineError::PoolExhausted { capacity: 8 });
        assert!(err.is_transient());
        assert!(!EngineError::DeviceUnavailable("gone".into()).is_transient());
    }

    #[test]
    fn messages_name_the_failure() {
        let err = EngineError::EnvelopeScheduling("negative attack".into());
        assert_eq!(err.to_string(), "invalid voice envelope: negative attack");
    }
}
