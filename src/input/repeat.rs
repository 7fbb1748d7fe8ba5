//! Held-button repeat.
//!
//! A [`Repeater`] watches one [`ButtonState`] across ticks and turns a held
//! button into discrete steps: one [`Step::Press`] on the press edge, then a
//! [`Step::Repeat`] every `rate_ms` once the button has been held for
//! `after_ms`. Each consumer owns its own repeaters, so thresholds are per
//! consumer.

use serde::{Deserialize, Serialize};

use super::snapshot::ButtonState;

// ---------------------------------------------------------------------------
// RepeatSettings
// ---------------------------------------------------------------------------

/// Repeat thresholds in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatSettings {
    /// Delay between the press and the first repeat.
    pub after_ms: u32,
    /// Interval between subsequent repeats.
    pub rate_ms: u32,
}

impl Default for RepeatSettings {
    fn default() -> Self {
        Self {
            after_ms: 400,
            rate_ms: 200,
        }
    }
}

impl RepeatSettings {
    /// Create settings with explicit thresholds.
    pub fn new(after_ms: u32, rate_ms: u32) -> Self {
        Self { after_ms, rate_ms }
    }
}

// ---------------------------------------------------------------------------
// Repeater
// ---------------------------------------------------------------------------

/// A discrete step produced by a held button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The button was just pressed.
    Press,
    /// The button has been held long enough for another step.
    Repeat,
}

/// Per-button repeat state machine.
#[derive(Debug, Clone, Default)]
pub struct Repeater {
    settings: RepeatSettings,
    /// Milliseconds left until the next repeat. `None` while the button is
    /// up, or while it is held from before a suppression.
    countdown: Option<i64>,
    /// Remaining ticks during which presses are ignored.
    suppress: u8,
}

impl Repeater {
    /// Create a repeater with the given thresholds.
    pub fn new(settings: RepeatSettings) -> Self {
        Self {
            settings,
            countdown: None,
            suppress: 0,
        }
    }

    /// Current thresholds.
    pub fn settings(&self) -> RepeatSettings {
        self.settings
    }

    /// Replace the thresholds. Takes effect from the next step.
    pub fn set_settings(&mut self, settings: RepeatSettings) {
        self.settings = settings;
    }

    /// Ignore the button for the next `ticks` updates.
    ///
    /// A button still held once the suppression ends does not produce a
    /// press; it has to be released and pressed again.
    pub fn suppress(&mut self, ticks: u8) {
        self.suppress = ticks;
        self.countdown = None;
    }

    /// Feed this tick's button state. Returns at most one step per tick.
    pub fn update(&mut self, button: &ButtonState, delta_ms: u32) -> Option<Step> {
        if self.suppress > 0 {
            self.suppress -= 1;
            self.countdown = None;
            return None;
        }
        if !button.down {
            self.countdown = None;
            return None;
        }
        if button.pressed {
            self.countdown = Some(i64::from(self.settings.after_ms));
            return Some(Step::Press);
        }
        let left = self.countdown.as_mut()?;
        *left -= i64::from(delta_ms);
        if *left > 0 {
            return None;
        }
        let rate = i64::from(self.settings.rate_ms.max(1));
        *left += rate;
        if *left <= 0 {
            // Overran by more than one period: restart instead of bursting.
            *left = rate;
        }
        Some(Step::Repeat)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
