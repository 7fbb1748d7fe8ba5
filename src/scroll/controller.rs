//! Discrete scroll controller with eased position.

use crate::input::InputSnapshot;

use super::Scroller;

/// Distance below which the eased position snaps onto the target.
pub(crate) const SNAP_EPSILON: f32 = 0.005;

/// Default easing time constant in milliseconds.
const DEFAULT_TAU_MS: f32 = 60.0;

// ---------------------------------------------------------------------------
// ScrollState
// ---------------------------------------------------------------------------

/// How far a drag may pull the position past either end, in items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollLimits {
    pub overshoot: f32,
}

impl Default for ScrollLimits {
    fn default() -> Self {
        Self { overshoot: 0.5 }
    }
}

/// Position and selection of a one-dimensional list.
///
/// `target` is always in `[0, item_count - 1]` (`0` for an empty list).
/// `position` is the animated position used for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    pub position: f32,
    pub target: usize,
    pub item_count: usize,
    pub limits: ScrollLimits,
}

impl ScrollState {
    /// Highest valid target.
    pub fn last_index(&self) -> usize {
        self.item_count.saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// ScrollController
// ---------------------------------------------------------------------------

/// Scroll controller driven by discrete left/right steps.
///
/// `think` eases the position towards the target exponentially: it never
/// overshoots, settles in bounded time and is a no-op for `delta_ms = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollController {
    state: ScrollState,
    tau_ms: f32,
}

impl Default for ScrollController {
    fn default() -> Self {
        Self {
            state: ScrollState::default(),
            tau_ms: DEFAULT_TAU_MS,
        }
    }
}

impl ScrollController {
    /// Create a controller for `item_count` items, positioned on the first.
    pub fn new(item_count: usize) -> Self {
        let mut controller = Self::default();
        controller.state.item_count = item_count;
        controller
    }

    /// Set the easing time constant. Non-positive values make the position
    /// jump straight to the target.
    pub fn with_time_constant(mut self, tau_ms: f32) -> Self {
        self.tau_ms = tau_ms;
        self
    }

    /// Set the drag overshoot bound.
    pub fn with_limits(mut self, limits: ScrollLimits) -> Self {
        self.state.limits = limits;
        self
    }

    /// Current state.
    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    /// Select `index` (clamped) and let the position ease there.
    pub fn set_target(&mut self, index: usize) {
        self.state.target = index.min(self.state.last_index());
    }

    /// Select `index` (clamped) and move the position there immediately.
    pub fn jump_to(&mut self, index: usize) {
        self.set_target(index);
        self.state.position = self.state.target as f32;
    }

    /// Whether the position has settled on the target.
    pub fn is_settled(&self) -> bool {
        self.state.position == self.state.target as f32
    }

    pub(crate) fn set_position(&mut self, position: f32) {
        self.state.position = position;
    }

    /// Advance the easing by `delta_ms`.
    pub fn ease(&mut self, delta_ms: u32) {
        let target = self.state.target as f32;
        let diff = target - self.state.position;
        if diff.abs() < SNAP_EPSILON {
            self.state.position = target;
            return;
        }
        let factor = if self.tau_ms > 0.0 {
            1.0 - (-(delta_ms as f32) / self.tau_ms).exp()
        } else {
            1.0
        };
        self.state.position += diff * factor;
        if (target - self.state.position).abs() < SNAP_EPSILON {
            self.state.position = target;
        }
    }
}

impl Scroller for ScrollController {
    fn scroll_left(&mut self) {
        self.state.target = self.state.target.saturating_sub(1);
    }

    fn scroll_right(&mut self) {
        self.state.target = (self.state.target + 1).min(self.state.last_index());
    }

    fn at_left_limit(&self) -> bool {
        self.state.target == 0
    }

    fn at_right_limit(&self) -> bool {
        self.state.target >= self.state.last_index()
    }

    fn set_item_count(&mut self, count: usize) {
        self.state.item_count = count;
        self.state.target = self.state.target.min(self.state.last_index());
    }

    fn item_count(&self) -> usize {
        self.state.item_count
    }

    fn target(&self) -> usize {
        self.state.target
    }

    fn position(&self) -> f32 {
        self.state.position
    }

    fn think(&mut self, _input: &InputSnapshot, delta_ms: u32) {
        self.ease(delta_ms);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
