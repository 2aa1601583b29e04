use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest mode name kept, in bytes.
pub const MODE_NAME_LEN: usize = 32;

/// A presentation mode's name, stored inline.
///
/// Events cross to the audio thread and are dropped there, so they must not
/// own heap memory. Longer names are cut at the last char boundary that fits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeName {
    bytes: [u8; MODE_NAME_LEN],
    len: u8,
}

impl ModeName {
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(MODE_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0; MODE_NAME_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl From<&str> for ModeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModeName {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<ModeName> for String {
    fn from(name: ModeName) -> Self {
        name.as_str().to_owned()
    }
}

impl fmt::Debug for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// What happened at the pointer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerKind {
    /// Pointer pressed.
    Click,
    /// Pointer released.
    Release,
    /// Pointer crossed into a facet at local `(u, v)` in 0..=1.
    FacetEnter { facet: u32, u: f32, v: f32 },
    /// Continuous motion while hovering, normalized device coords in -1..=1.
    PositionalMove { x: f32, y: f32 },
    /// A presentation mode (rainbow, magnetic, ...) was switched.
    ModeToggle { name: ModeName, active: bool },
    /// Pointer left the object.
    Leave,
}

impl TriggerKind {
    /// Discrete triggers are semantically required and never rate limited.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            TriggerKind::Click
                | TriggerKind::Release
                | TriggerKind::ModeToggle { .. }
                | TriggerKind::Leave
        )
    }
}

/// A single trigger from the pointer layer, consumed once.
///
/// `timestamp` is a monotonic time in seconds chosen by the caller (the
/// input layer's clock). The engine only ever compares timestamps with each
/// other, never with wall time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub kind: TriggerKind,
    pub timestamp: f64,
}

impl TriggerEvent {
    pub fn new(kind: TriggerKind, timestamp: f64) -> Self {
        Self { kind, timestamp }
    }

    pub fn press(timestamp: f64) -> Self {
        Self::new(TriggerKind::Click, timestamp)
    }

    pub fn release(timestamp: f64) -> Self {
        Self::new(TriggerKind::Release, timestamp)
    }

    pub fn pointer_enter(facet: u32, u: f32, v: f32, timestamp: f64) -> Self {
        Self::new(TriggerKind::FacetEnter { facet, u, v }, timestamp)
    }

    pub fn pointer_move(x: f32, y: f32, timestamp: f64) -> Self {
        Self::new(TriggerKind::PositionalMove { x, y }, timestamp)
    }

    pub fn mode_toggle(name: &str, active: bool, timestamp: f64) -> Self {
        Self::new(
            TriggerKind::ModeToggle {
                name: ModeName::new(name),
                active,
            },
            timestamp,
        )
    }

    pub fn leave(timestamp: f64) -> Self {
        Self::new(TriggerKind::Leave, timestamp)
    }
}
