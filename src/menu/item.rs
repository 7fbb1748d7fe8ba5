//! Menu items: a label plus what happens when the item is selected.

use std::fmt;

use crate::graphics::Graphics;
use crate::input::InputSnapshot;
use crate::nav::{Navigator, TransitionKind};
use crate::responder::View;

/// One entry of a menu.
///
/// Layouts position and scale the context before calling
/// [`draw`](MenuItem::draw), so items draw around the local origin.
pub trait MenuItem {
    /// Activate the item.
    fn press(&mut self, nav: &mut Navigator);

    /// Printable label.
    fn label(&self) -> &str;

    /// Render the item at the origin. Defaults to its centered label.
    fn draw(&self, g: &mut Graphics) {
        g.text_centered(0.0, 0.0, self.label());
    }

    fn think(&mut self, _input: &InputSnapshot, _delta_ms: u32) {}
}

impl fmt::Debug for dyn MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MenuItem").field(&self.label()).finish()
    }
}

// ---------------------------------------------------------------------------
// MenuItemForeground
// ---------------------------------------------------------------------------

/// Pushes a freshly built view when selected.
pub struct MenuItemForeground {
    label: String,
    build: Box<dyn FnMut() -> Box<dyn View>>,
}

impl MenuItemForeground {
    pub fn new(label: impl Into<String>, build: impl FnMut() -> Box<dyn View> + 'static) -> Self {
        Self {
            label: label.into(),
            build: Box::new(build),
        }
    }
}

impl MenuItem for MenuItemForeground {
    fn press(&mut self, nav: &mut Navigator) {
        nav.push((self.build)(), TransitionKind::SwipeLeft);
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// MenuItemAction
// ---------------------------------------------------------------------------

/// Runs a closure when selected.
pub struct MenuItemAction {
    label: String,
    action: Box<dyn FnMut()>,
}

impl MenuItemAction {
    pub fn new(label: impl Into<String>, action: impl FnMut() + 'static) -> Self {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }
}

impl MenuItem for MenuItemAction {
    fn press(&mut self, _nav: &mut Navigator) {
        (self.action)();
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// MenuItemNoop
// ---------------------------------------------------------------------------

/// A label that does nothing.
#[derive(Debug, Clone)]
pub struct MenuItemNoop {
    label: String,
}

impl MenuItemNoop {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl MenuItem for MenuItemNoop {
    fn press(&mut self, _nav: &mut Navigator) {}

    fn label(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// MenuItemBack
// ---------------------------------------------------------------------------

/// Navigates back when selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuItemBack;

impl MenuItem for MenuItemBack {
    fn press(&mut self, nav: &mut Navigator) {
        nav.pop(TransitionKind::SwipeRight);
    }

    fn label(&self) -> &str {
        "Back"
    }

    fn draw(&self, g: &mut Graphics) {
        g.text_centered(0.0, 0.0, "<");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
