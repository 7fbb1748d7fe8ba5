//! Scroll controller that also follows drags on a touch petal.

use crate::input::{GesturePhase, InputSnapshot};

use super::controller::{ScrollController, ScrollLimits, ScrollState};
use super::Scroller;

/// Items scrolled per unit of petal angle.
const DEFAULT_SENSITIVITY: f32 = 4.0;

/// Fraction of drag movement applied past either end of the list.
const RUBBER_BAND: f32 = 0.5;

/// A [`ScrollController`] that additionally scrolls with drags on one petal.
///
/// While the petal is touched, angular movement is added directly to the
/// position, with rubber-band resistance past the ends and a hard bound of
/// `limits.overshoot` items. On release the target becomes the nearest valid
/// item and the position eases onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureScrollController {
    inner: ScrollController,
    zone: usize,
    sensitivity: f32,
    dragging: bool,
}

impl GestureScrollController {
    /// Create a controller for `item_count` items following petal `zone`.
    pub fn new(item_count: usize, zone: usize) -> Self {
        Self {
            inner: ScrollController::new(item_count),
            zone,
            sensitivity: DEFAULT_SENSITIVITY,
            dragging: false,
        }
    }

    /// Items scrolled per unit of petal angle. Negative values invert the
    /// drag direction.
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Set the drag overshoot bound.
    pub fn with_limits(mut self, limits: ScrollLimits) -> Self {
        self.inner = self.inner.with_limits(limits);
        self
    }

    /// The petal this controller follows.
    pub fn zone(&self) -> usize {
        self.zone
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Current state.
    pub fn state(&self) -> &ScrollState {
        self.inner.state()
    }

    fn drag(&mut self, amount: f32) {
        let state = *self.inner.state();
        let last = state.last_index() as f32;
        let overshoot = state.limits.overshoot.max(0.0);
        let mut position = state.position;
        let outside = position < 0.0 || position > last;
        let heading_out = (position <= 0.0 && amount < 0.0) || (position >= last && amount > 0.0);
        position += if outside || heading_out {
            amount * RUBBER_BAND
        } else {
            amount
        };
        position = position.clamp(-overshoot, last + overshoot);
        self.inner.set_position(position);
        self.inner.set_target(nearest(position, last));
    }

    fn release(&mut self) {
        self.dragging = false;
        let last = self.inner.state().last_index() as f32;
        self.inner.set_target(nearest(self.inner.position(), last));
    }
}

/// Nearest valid index to `position`.
fn nearest(position: f32, last: f32) -> usize {
    position.round().clamp(0.0, last) as usize
}

impl Scroller for GestureScrollController {
    fn scroll_left(&mut self) {
        self.inner.scroll_left();
    }

    fn scroll_right(&mut self) {
        self.inner.scroll_right();
    }

    fn at_left_limit(&self) -> bool {
        self.inner.at_left_limit()
    }

    fn at_right_limit(&self) -> bool {
        self.inner.at_right_limit()
    }

    fn set_item_count(&mut self, count: usize) {
        self.inner.set_item_count(count);
    }

    fn item_count(&self) -> usize {
        self.inner.item_count()
    }

    fn target(&self) -> usize {
        self.inner.target()
    }

    fn position(&self) -> f32 {
        self.inner.position()
    }

    fn think(&mut self, input: &InputSnapshot, delta_ms: u32) {
        let Some(petal) = input.petal(self.zone) else {
            self.inner.ease(delta_ms);
            return;
        };
        match petal.phase {
            GesturePhase::Begin => self.dragging = true,
            GesturePhase::Moved => {
                // A touch already held when the controller appeared is ignored.
                if self.dragging && petal.delta.phi != 0.0 {
                    self.drag(petal.delta.phi * self.sensitivity);
                }
            }
            GesturePhase::Ended | GesturePhase::Up => {
                if self.dragging {
                    self.release();
                }
            }
        }
        if !self.dragging {
            self.inner.ease(delta_ms);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputGatherer, RawInput, RawPetal};

    const ZONE: usize = 2;

    struct Finger {
        gatherer: InputGatherer,
        phi: f32,
    }

    impl Finger {
        fn new() -> Self {
            Self {
                gatherer: InputGatherer::new(),
                phi: 0.0,
            }
        }

        fn snapshot(&mut self, pressed: bool) -> InputSnapshot {
            let mut raw = RawInput::default();
            raw.petals[ZONE] = RawPetal {
                pressed,
                pressure: if pressed { 1000 } else { 0 },
                rad: 0.5,
                phi: self.phi,
            };
            self.gatherer.gather(raw, 20)
        }

        fn down(&mut self) -> InputSnapshot {
            self.snapshot(true)
        }

        fn move_by(&mut self, dphi: f32) -> InputSnapshot {
            self.phi += dphi;
            self.snapshot(true)
        }

        fn up(&mut self) -> InputSnapshot {
            self.snapshot(false)
        }
    }

    #[test]
    fn drag_moves_position_directly() {
        let mut c = GestureScrollController::new(10, ZONE);
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        assert!(c.is_dragging());
        c.think(&f.move_by(0.25), 20);
        assert!((c.position() - 1.0).abs() < 1e-5);
        assert_eq!(c.target(), 1);
    }

    #[test]
    fn release_eases_to_nearest_item() {
        let mut c = GestureScrollController::new(10, ZONE);
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        c.think(&f.move_by(0.4), 20); // position 1.6
        c.think(&f.up(), 20);
        assert!(!c.is_dragging());
        assert_eq!(c.target(), 2);

        let idle = f.up();
        let mut ticks = 0;
        while c.position() != 2.0 && ticks < 50 {
            c.think(&idle, 20);
            ticks += 1;
        }
        assert_eq!(c.position(), 2.0);
        assert!(ticks < 30);
    }

    #[test]
    fn rubber_band_past_start_is_bounded() {
        let mut c = GestureScrollController::new(5, ZONE);
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        c.think(&f.move_by(-0.05), 20);
        // Half the movement applies past the end.
        assert!((c.position() + 0.1).abs() < 1e-5);
        for _ in 0..20 {
            c.think(&f.move_by(-0.2), 20);
        }
        assert_eq!(c.position(), -0.5);
        assert_eq!(c.target(), 0);

        c.think(&f.up(), 20);
        for _ in 0..40 {
            c.think(&f.up(), 20);
        }
        assert_eq!(c.position(), 0.0);
    }

    #[test]
    fn rubber_band_past_end_is_bounded() {
        let mut c = GestureScrollController::new(3, ZONE)
            .with_limits(ScrollLimits { overshoot: 0.25 });
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        for _ in 0..20 {
            c.think(&f.move_by(0.3), 20);
        }
        assert_eq!(c.position(), 2.25);
        assert_eq!(c.target(), 2);
    }

    #[test]
    fn target_stays_in_range_for_any_drag() {
        let mut c = GestureScrollController::new(4, ZONE);
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        for i in 0..200 {
            let dphi = if (i / 25) % 2 == 0 { 0.13 } else { -0.17 };
            c.think(&f.move_by(dphi), 20);
            assert!(c.target() <= 3);
        }
    }

    #[test]
    fn buttons_still_scroll() {
        let mut c = GestureScrollController::new(4, ZONE);
        c.scroll_right();
        c.scroll_right();
        assert_eq!(c.target(), 2);
        c.scroll_left();
        assert_eq!(c.target(), 1);
    }

    #[test]
    fn other_petals_are_ignored() {
        let mut c = GestureScrollController::new(4, 7);
        let mut f = Finger::new();
        c.think(&f.down(), 20);
        c.think(&f.move_by(0.5), 20);
        assert_eq!(c.position(), 0.0);
    }
}
