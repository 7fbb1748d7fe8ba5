//! Integration tests for petal-ui.
//!
//! These tests exercise the public API from outside the crate, driving the
//! reactor through the headless pilot and checking that navigation, menus,
//! events and the frame pipeline work together.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use petal_ui::event::{Condition, Event, EventRegistry, Payload, Sequencer};
use petal_ui::graphics::Graphics;
use petal_ui::input::{Direction, InputSnapshot, Switch};
use petal_ui::menu::{ListLayout, Menu, MenuItem, MenuItemBack, MenuItemForeground, MenuItemNoop};
use petal_ui::nav::{NavPhase, TransitionKind, ViewManager};
use petal_ui::prelude::Context;
use petal_ui::reactor::ReactorConfig;
use petal_ui::responder::{FnView, Responder, View};
use petal_ui::scroll::Scroller;
use petal_ui::testing::{draw_to_string, Pilot};
use pretty_assertions::assert_eq;

fn label(text: &'static str) -> Box<dyn View> {
    Box::new(FnView::new(move |g: &mut Graphics| {
        g.text(0.0, 0.0, text);
    }))
}

fn menu_b() -> Box<dyn View> {
    let items: Vec<Box<dyn MenuItem>> = vec![
        Box::new(MenuItemNoop::new("b0")),
        Box::new(MenuItemBack),
    ];
    Box::new(Menu::new(items, ListLayout))
}

fn menu_a() -> Menu<ListLayout> {
    let items: Vec<Box<dyn MenuItem>> = vec![
        Box::new(MenuItemNoop::new("a0")),
        Box::new(MenuItemForeground::new("open b", menu_b)),
    ];
    Menu::new(items, ListLayout)
}

fn vm(pilot: &Pilot) -> &ViewManager {
    pilot.top_as::<ViewManager>().unwrap()
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[test]
fn test_push_then_pop_restores_menu() {
    let config = ReactorConfig::default();
    let mut pilot = Pilot::new(config.view_manager(Box::new(menu_a())));
    pilot.tick_n(3);

    pilot.press(Switch::App, Direction::Right);
    pilot.tick_n(20);
    let before = *vm(&pilot)
        .top_as::<Menu<ListLayout>>()
        .unwrap()
        .controller()
        .scroller()
        .state();
    assert_eq!(before.position, 1.0);
    pilot.press(Switch::App, Direction::Middle);
    assert_eq!(vm(&pilot).depth(), 2);
    assert_eq!(
        vm(&pilot).transition().map(|t| t.kind()),
        Some(TransitionKind::SwipeLeft)
    );
    pilot.tick_n(10);
    assert!(vm(&pilot).is_idle());

    // OS middle is the back button.
    pilot.press(Switch::Os, Direction::Middle);
    assert_eq!(
        vm(&pilot).transition().map(|t| t.kind()),
        Some(TransitionKind::SwipeRight)
    );
    pilot.tick_n(10);

    let vm = vm(&pilot);
    assert_eq!(vm.depth(), 1);
    let menu = vm.top_as::<Menu<ListLayout>>().unwrap();
    assert_eq!(menu.controller().items().len(), 2);
    assert_eq!(menu.controller().scroller().target(), 1);
    assert_eq!(*menu.controller().scroller().state(), before);
}

#[test]
fn test_pop_on_single_entry_is_noop() {
    let mut manager = ViewManager::new(label("root"));
    let mut cx = Context::new();
    assert_eq!(manager.pop(TransitionKind::SwipeRight), Ok(()));
    manager.think(&mut cx, &InputSnapshot::pressing(Switch::Os, Direction::Middle), 20);
    assert_eq!(manager.depth(), 1);
    assert!(manager.is_idle());
    assert_eq!(draw_to_string(&manager), r#"text 0.0,0.0 s20.0 #ffffff a1.00 "root""#);
}

#[test]
fn test_transition_completes_within_ceil_ticks() {
    let mut manager = ViewManager::new(label("a")).with_transition_ms(150);
    let mut cx = Context::new();
    manager.push(label("b"), TransitionKind::Blend).unwrap();
    let idle = InputSnapshot::idle();
    for _ in 0..7 {
        manager.think(&mut cx, &idle, 20);
    }
    assert_eq!(manager.phase(), NavPhase::Entering);
    manager.think(&mut cx, &idle, 20);
    assert!(manager.is_idle());
}

#[test]
fn test_navigation_rejected_mid_flight() {
    let mut manager = ViewManager::new(label("a"));
    manager.push(label("b"), TransitionKind::SwipeLeft).unwrap();
    assert!(manager.push(label("c"), TransitionKind::SwipeLeft).is_err());
    assert!(manager.pop(TransitionKind::SwipeRight).is_err());
    assert_eq!(manager.depth(), 2);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[test]
fn test_touch_condition_fires_once_per_dispatch() {
    let mut registry = EventRegistry::new();
    let hits = Rc::new(Cell::new(0));
    let sink = Rc::clone(&hits);
    let condition: Condition = r#"type == "touch" and pressed"#.parse().unwrap();
    registry.register(Event::new("touch", condition, move |_: &Payload| {
        sink.set(sink.get() + 1);
    }));

    let payload = Payload::Touch {
        zone: 3,
        pressed: true,
        change: true,
        pressure: 1000,
        radius: 0.0,
        angle: 0.0,
    };
    assert_eq!(registry.dispatch(&payload), 1);
    assert_eq!(hits.get(), 1);
}

#[test]
fn test_group_removal_silences_events() {
    let mut registry = EventRegistry::new();
    let hits = Rc::new(Cell::new(0));
    let group = registry.new_group();
    for name in ["one", "two"] {
        let sink = Rc::clone(&hits);
        registry.register(
            Event::new(name, Condition::kind("ping"), move |_: &Payload| {
                sink.set(sink.get() + 1);
            })
            .group(group),
        );
    }
    assert_eq!(registry.dispatch(&Payload::custom("ping")), 2);
    assert_eq!(registry.remove_group(group), 2);
    assert_eq!(registry.dispatch(&Payload::custom("ping")), 0);
    assert_eq!(hits.get(), 2);
}

#[test]
fn test_sequencer_fires_every_62_5_ms() {
    let mut registry = EventRegistry::new();
    let steps = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&steps);
    registry.register(Event::new(
        "beat",
        Condition::kind("timer"),
        move |p: &Payload| {
            if let Payload::Timer { step, .. } = p {
                sink.borrow_mut().push(*step);
            }
        },
    ));
    registry.add_timer(Sequencer::new("beat", 120.0, 8.0, 1.0).unwrap().steps(4));
    for _ in 0..1000 {
        registry.advance_timers(1);
    }
    let steps = steps.borrow();
    assert_eq!(steps.len(), 16);
    assert_eq!(&steps[..6], &[0, 1, 2, 3, 0, 1]);
}

// ---------------------------------------------------------------------------
// Reactor
// ---------------------------------------------------------------------------

#[test]
fn test_zero_delta_ticks() {
    let mut pilot = Pilot::new(ViewManager::new(label("a")));
    pilot.tick();
    for _ in 0..5 {
        assert_eq!(pilot.advance(0).delta_ms, 0);
    }
    assert!(vm(&pilot).is_idle());
}

#[test]
fn test_busy_display_skips_draws_but_keeps_thinking() {
    let mut pilot = Pilot::new(menu_a());
    pilot.stall_display(true);
    pilot.tick_n(3);
    pilot.press(Switch::App, Direction::Right);
    assert_eq!(pilot.stats().frames_drawn, 1);
    assert_eq!(pilot.stats().frames_skipped, 4);
    let menu = pilot.top_as::<Menu<ListLayout>>().unwrap();
    assert_eq!(menu.controller().scroller().target(), 1);
}

struct Fragile {
    ticks: u32,
}

impl Responder for Fragile {
    fn think(&mut self, _cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {
        self.ticks += 1;
        if self.ticks == 2 {
            panic!("fragile responder broke");
        }
    }

    fn draw(&self, g: &mut Graphics) {
        g.text(0.0, 0.0, self.ticks.to_string());
    }
}

#[test]
fn test_panicking_responder_is_isolated() {
    let mut pilot = Pilot::new(Fragile { ticks: 0 });
    assert!(!pilot.tick().failed);
    assert!(pilot.tick().failed);
    let report = pilot.tick();
    assert!(!report.failed);
    assert!(report.drew);
    assert_eq!(pilot.stats().failures, 1);
    assert_eq!(pilot.last_frame().unwrap().texts().collect::<Vec<_>>(), vec!["3"]);
}
