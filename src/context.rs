//! The per-runtime context lent to responders.
//!
//! There is no global engine state. The reactor owns one [`Context`] and
//! passes it by `&mut` into every `think` and view hook; views register
//! events, request navigation and drive actuators through it.

use crate::event::EventRegistry;
use crate::hal::{Audio, LedStrip, NullAudio, NullLeds};
use crate::nav::Navigator;
use crate::reactor::ReactorStats;

/// Shared services for one reactor.
pub struct Context {
    /// Condition/action dispatch table and timers.
    pub events: EventRegistry,
    /// Queued navigation requests, applied by the view manager.
    pub nav: Navigator,
    pub audio: Box<dyn Audio>,
    pub leds: Box<dyn LedStrip>,
    /// Timing statistics, updated by the reactor every tick.
    pub stats: ReactorStats,
}

impl Context {
    /// A context with inert actuators.
    pub fn new() -> Self {
        Self {
            events: EventRegistry::new(),
            nav: Navigator::new(),
            audio: Box::new(NullAudio),
            leds: Box::new(NullLeds),
            stats: ReactorStats::new(),
        }
    }

    /// Use `audio` for volume control (builder).
    pub fn with_audio(mut self, audio: impl Audio + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Use `leds` for the LED ring (builder).
    pub fn with_leds(mut self, leds: impl LedStrip + 'static) -> Self {
        self.leds = Box::new(leds);
        self
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
