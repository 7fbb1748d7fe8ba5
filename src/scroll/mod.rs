//! Scroll controllers for one-dimensional lists.
//!
//! A scroller tracks two things: the *target*, the integer item the user
//! has selected, and the *position*, a float that animates towards the
//! target and is what layouts draw from.

pub mod controller;
pub mod gesture;

pub use controller::{ScrollController, ScrollLimits, ScrollState};
pub use gesture::GestureScrollController;

use crate::input::InputSnapshot;

/// The scroll interface menus are generic over.
pub trait Scroller {
    /// Select the previous item, stopping at the first.
    fn scroll_left(&mut self);

    /// Select the next item, stopping at the last.
    fn scroll_right(&mut self);

    fn at_left_limit(&self) -> bool;

    fn at_right_limit(&self) -> bool;

    /// Change the number of items, re-clamping the target.
    fn set_item_count(&mut self, count: usize);

    fn item_count(&self) -> usize;

    /// The selected item, in `[0, item_count - 1]`.
    fn target(&self) -> usize;

    /// The animated position.
    fn position(&self) -> f32;

    /// Advance animation and gesture tracking by one tick.
    fn think(&mut self, input: &InputSnapshot, delta_ms: u32);
}
