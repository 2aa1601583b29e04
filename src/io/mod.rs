// Purpose - external interfaces: trigger events in, control messages across threads,
// and the optional device output.

pub mod event;
pub mod message;
#[cfg(feature = "cpal_output")]
pub mod output;

pub use event::{ModeName, TriggerEvent, TriggerKind};
pub use message::{ControlMessage, MessageReceiver, MessageSender};
