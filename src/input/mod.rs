//! Input: raw sources, per-tick snapshots and held-button repeat.

pub mod repeat;
pub mod snapshot;
pub mod source;
pub mod terminal;

pub use repeat::{RepeatSettings, Repeater, Step};
pub use snapshot::{
    ButtonState, Buttons, Direction, GesturePhase, ImuReading, InputGatherer, InputSnapshot,
    PetalState, Polar, RawInput, RawPetal, Switch, SwitchPosition, TriSwitch, PETAL_COUNT,
};
pub use source::{InputSource, ManualInput, NullInput};
pub use terminal::TerminalInput;
