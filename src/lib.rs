//! # petal-ui
//!
//! A cooperative UI runtime for a round, 240×240 handheld display with two
//! tri-state shoulder switches, ten capacitive touch petals and an LED ring.
//!
//! A single [`reactor::Reactor`] ticks at a fixed rate. Each tick it gathers
//! one debounced [`input::InputSnapshot`], dispatches button, touch and timer
//! payloads through the [`event::EventRegistry`], runs background
//! [`reactor::Processor`]s, lets the top [`responder::Responder`] think, and
//! draws a frame unless the display is still busy with the previous one.
//!
//! ## Core Systems
//!
//! - **[`reactor`]** — Fixed-cadence scheduler, config, statistics, processors
//! - **[`nav`]** — View stack with animated push/pop/replace transitions
//! - **[`event`]** — Condition/action registry, text conditions, sequencer timers
//! - **[`input`]** — Input sources, per-tick snapshots, held-button repeat
//! - **[`scroll`]** — Animated button and gesture scroll controllers
//! - **[`menu`]** — Menu items, the shared menu input machine, list/sun/ring layouts
//! - **[`graphics`]** — Immediate-mode drawing, frame pipeline, terminal rasterizer
//! - **[`overlay`]** — Indicator and debug overlays over the main responder
//! - **[`hal`]** — Audio, LED ring and persisted settings
//! - **[`responder`]** — Responder and View traits
//! - **[`context`]** — Per-runtime services lent to responders
//! - **[`geometry`]** — Points, rectangles, display extent
//! - **[`testing`]** — Headless Pilot and snapshot helpers

// Foundation
pub mod geometry;

// Input and events
pub mod event;
pub mod input;

// Drawing
pub mod graphics;
pub mod overlay;

// Responders
pub mod context;
pub mod menu;
pub mod nav;
pub mod responder;
pub mod scroll;

// Runtime
pub mod hal;
pub mod reactor;

// Testing
pub mod testing;

/// Commonly used items.
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::event::{Condition, Event, EventRegistry, Payload, Sequencer};
    pub use crate::graphics::{Color, Graphics};
    pub use crate::input::{Direction, InputSnapshot, Switch};
    pub use crate::menu::{
        ListLayout, Menu, MenuItem, MenuItemAction, MenuItemBack, MenuItemForeground,
        MenuItemNoop, RingLayout, SunLayout,
    };
    pub use crate::nav::{TransitionKind, ViewManager};
    pub use crate::reactor::{Reactor, ReactorConfig};
    pub use crate::responder::{FnView, Responder, View};
    pub use crate::scroll::{GestureScrollController, ScrollController, Scroller};
}
