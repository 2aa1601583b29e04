// Purpose: everything that makes sound. Discrete one-shot tones come from the
// pool, the continuous hover channel owns its two voices outright.

pub mod continuous;
pub mod timbre;
pub mod tone;
pub mod voice;

pub use continuous::{ContinuousState, ContinuousVoiceEngine};
pub use tone::{ChordHandle, ToneSynthesizer};
pub use voice::{Voice, VoiceHandle, VoiceSpec, VoiceStage, VoiceUnit};
