//! Menus: a scroller over items, driven by buttons, drawn by a layout.
//!
//! [`Menu`] pairs the shared [`MenuController`] input state machine with a
//! [`MenuLayout`] that decides how items look. Switching layouts never
//! changes how a menu responds to input.

pub mod controller;
pub mod item;
pub mod layout;

pub use controller::{MenuBindings, MenuController};
pub use item::{MenuItem, MenuItemAction, MenuItemBack, MenuItemForeground, MenuItemNoop};
pub use layout::{ListLayout, MenuLayout, RingLayout, SunLayout};

use crate::context::Context;
use crate::graphics::Graphics;
use crate::input::InputSnapshot;
use crate::responder::{Responder, View};
use crate::scroll::{ScrollController, Scroller};

/// Ticks of input ignored after a menu regains the foreground, so the press
/// that navigated here does not also act on the menu.
const ENTER_SUPPRESS_TICKS: u8 = 2;

/// A navigable menu view.
pub struct Menu<L, S = ScrollController> {
    controller: MenuController<S>,
    layout: L,
}

impl<L: MenuLayout> Menu<L, ScrollController> {
    pub fn new(items: Vec<Box<dyn MenuItem>>, layout: L) -> Self {
        Self {
            controller: MenuController::new(items),
            layout,
        }
    }
}

impl<L: MenuLayout, S: Scroller> Menu<L, S> {
    /// Wrap an already configured controller.
    pub fn with_controller(controller: MenuController<S>, layout: L) -> Self {
        Self { controller, layout }
    }

    pub fn controller(&self) -> &MenuController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MenuController<S> {
        &mut self.controller
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }
}

impl<L, S> Responder for Menu<L, S>
where
    L: MenuLayout + 'static,
    S: Scroller + 'static,
{
    fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        self.controller.think(cx, input, delta_ms);
        self.layout.think(delta_ms);
    }

    fn draw(&self, g: &mut Graphics) {
        self.layout.draw(
            g,
            self.controller.items(),
            self.controller.scroller().position(),
        );
    }
}

impl<L, S> View for Menu<L, S>
where
    L: MenuLayout + 'static,
    S: Scroller + 'static,
{
    fn on_enter(&mut self, _cx: &mut Context) {
        self.controller.suppress(ENTER_SUPPRESS_TICKS);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Direction, Switch};
    use crate::nav::{TransitionKind, ViewManager};
    use crate::responder::FnView;
    use crate::scroll::GestureScrollController;

    fn entries() -> Vec<Box<dyn MenuItem>> {
        vec![
            Box::new(MenuItemForeground::new("Clock", || {
                Box::new(FnView::new(|g: &mut Graphics| {
                    g.text(0.0, 0.0, "12:00");
                })) as Box<dyn View>
            })),
            Box::new(MenuItemNoop::new("About")),
            Box::new(MenuItemBack),
        ]
    }

    #[test]
    fn layouts_share_the_input_machine() {
        let mut cx = Context::new();
        let right = InputSnapshot::pressing(Switch::App, Direction::Right);
        let mut list = Menu::new(entries(), ListLayout);
        let mut ring = Menu::new(entries(), RingLayout::new("x"));
        list.think(&mut cx, &right, 20);
        ring.think(&mut cx, &right, 20);
        assert_eq!(list.controller().scroller().target(), 1);
        assert_eq!(ring.controller().scroller().target(), 1);
    }

    #[test]
    fn enter_suppresses_the_navigating_press() {
        let mut cx = Context::new();
        let mut menu = Menu::new(entries(), ListLayout);
        menu.on_enter(&mut cx);
        let select = InputSnapshot::pressing(Switch::App, Direction::Middle);
        menu.think(&mut cx, &select, 20);
        assert!(cx.nav.is_empty());
    }

    #[test]
    fn foreground_item_pushes_through_manager() {
        let mut cx = Context::new();
        let mut vm = ViewManager::new(Box::new(Menu::new(entries(), SunLayout::new())));
        vm.think(&mut cx, &InputSnapshot::idle(), 20);
        vm.think(&mut cx, &InputSnapshot::idle(), 20);
        vm.think(&mut cx, &InputSnapshot::idle(), 20);
        vm.think(
            &mut cx,
            &InputSnapshot::pressing(Switch::App, Direction::Middle),
            20,
        );
        assert_eq!(vm.depth(), 2);
        assert_eq!(
            vm.transition().map(|t| t.kind()),
            Some(TransitionKind::SwipeLeft)
        );
    }

    #[test]
    fn gesture_scrolled_menu() {
        let controller =
            MenuController::with_scroller(entries(), GestureScrollController::new(3, 0));
        let menu = Menu::with_controller(controller, ListLayout);
        let mut g = Graphics::new();
        menu.draw(&mut g);
        let list = g.finish();
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["Clock", "About", "<"]);
    }
}
