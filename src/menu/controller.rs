//! The input state machine shared by every menu.

use tracing::debug;

use super::MenuItem;
use crate::context::Context;
use crate::input::{Direction, InputSnapshot, RepeatSettings, Repeater, Step, Switch};
use crate::scroll::{ScrollController, Scroller};

/// Which buttons drive a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuBindings {
    pub previous: (Switch, Direction),
    pub next: (Switch, Direction),
    pub select: (Switch, Direction),
}

impl Default for MenuBindings {
    fn default() -> Self {
        Self {
            previous: (Switch::App, Direction::Left),
            next: (Switch::App, Direction::Right),
            select: (Switch::App, Direction::Middle),
        }
    }
}

/// A scroller over a list of items, driven by three buttons.
///
/// Presses of the previous/next buttons scroll one item. Holding them
/// repeats after a delay, except at the list's ends where repeats are
/// swallowed. The select button presses the targeted item.
pub struct MenuController<S = ScrollController> {
    items: Vec<Box<dyn MenuItem>>,
    scroll: S,
    bindings: MenuBindings,
    previous: Repeater,
    next: Repeater,
    confirm: Repeater,
}

impl MenuController<ScrollController> {
    /// A controller with a discrete scroller.
    pub fn new(items: Vec<Box<dyn MenuItem>>) -> Self {
        Self::with_scroller(items, ScrollController::default())
    }
}

impl<S: Scroller> MenuController<S> {
    /// A controller over `items` using `scroll` for the selection.
    pub fn with_scroller(items: Vec<Box<dyn MenuItem>>, mut scroll: S) -> Self {
        scroll.set_item_count(items.len());
        let repeat = RepeatSettings::default();
        Self {
            items,
            scroll,
            bindings: MenuBindings::default(),
            previous: Repeater::new(repeat),
            next: Repeater::new(repeat),
            confirm: Repeater::new(repeat),
        }
    }

    /// Use other buttons (builder).
    pub fn with_bindings(mut self, bindings: MenuBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Use other repeat thresholds for the directional buttons (builder).
    pub fn with_repeat(mut self, settings: RepeatSettings) -> Self {
        self.previous.set_settings(settings);
        self.next.set_settings(settings);
        self
    }

    pub fn bindings(&self) -> MenuBindings {
        self.bindings
    }

    pub fn items(&self) -> &[Box<dyn MenuItem>] {
        &self.items
    }

    /// Replace the items, keeping the selection where it still fits.
    pub fn set_items(&mut self, items: Vec<Box<dyn MenuItem>>) {
        self.scroll.set_item_count(items.len());
        self.items = items;
    }

    pub fn scroller(&self) -> &S {
        &self.scroll
    }

    pub fn scroller_mut(&mut self) -> &mut S {
        &mut self.scroll
    }

    /// The targeted item, `None` for an empty menu.
    pub fn selected(&self) -> Option<&dyn MenuItem> {
        self.items.get(self.scroll.target()).map(|item| item.as_ref())
    }

    /// Ignore all three buttons for the next `ticks` ticks.
    pub fn suppress(&mut self, ticks: u8) {
        self.previous.suppress(ticks);
        self.next.suppress(ticks);
        self.confirm.suppress(ticks);
    }

    /// Press the targeted item. Returns whether an item was pressed.
    pub fn select(&mut self, cx: &mut Context) -> bool {
        let target = self.scroll.target();
        match self.items.get_mut(target) {
            Some(item) => {
                debug!(target, label = item.label(), "menu item selected");
                item.press(&mut cx.nav);
                true
            }
            None => {
                debug!("select on empty menu ignored");
                false
            }
        }
    }

    pub fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        for item in &mut self.items {
            item.think(input, delta_ms);
        }
        self.scroll.think(input, delta_ms);

        let buttons = &input.buttons;
        let (switch, direction) = self.bindings.select;
        if self.confirm.update(buttons.button(switch, direction), delta_ms) == Some(Step::Press) {
            self.select(cx);
        }

        let (switch, direction) = self.bindings.previous;
        match self.previous.update(buttons.button(switch, direction), delta_ms) {
            Some(Step::Press) => self.scroll.scroll_left(),
            Some(Step::Repeat) if !self.scroll.at_left_limit() => self.scroll.scroll_left(),
            _ => {}
        }

        let (switch, direction) = self.bindings.next;
        match self.next.update(buttons.button(switch, direction), delta_ms) {
            Some(Step::Press) => self.scroll.scroll_right(),
            Some(Step::Repeat) if !self.scroll.at_right_limit() => self.scroll.scroll_right(),
            _ => {}
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
