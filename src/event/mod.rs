//! Event dispatch: payloads, conditions, the registry and sequencer timers.

pub mod condition;
pub mod payload;
pub mod registry;
pub mod timer;

pub use condition::{CompareOp, Condition, ConditionError};
pub use payload::{Payload, Value};
pub use registry::{Action, Capture, Event, EventId, EventRegistry, GroupId, TimerId};
pub use timer::{Sequencer, TimerError};
