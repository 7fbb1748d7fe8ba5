//! The navigation stack and its transition state machine.
//!
//! [`ViewManager`] owns a stack of views. Navigation starts a
//! [`Transition`] during which the outgoing and incoming views coexist;
//! a second navigation while one is in flight is rejected. Once progress
//! reaches 1 the outgoing view gets `on_exit` and the incoming view gets
//! `on_enter`, each exactly once.

use std::mem;

use tracing::debug;

use super::{NavPhase, NavRequest, Transition, TransitionKind};
use crate::context::Context;
use crate::graphics::Graphics;
use crate::input::{Direction, InputSnapshot, Switch};
use crate::responder::{Responder, View};

/// Default transition duration.
pub const DEFAULT_TRANSITION_MS: u32 = 150;

/// Errors from navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("a transition is already in flight")]
    TransitionInFlight,
}

// ---------------------------------------------------------------------------
// Flight
// ---------------------------------------------------------------------------

/// Where the outgoing view of a transition lives.
enum Outgoing {
    /// Still on the stack, just below the top (push).
    Covered,
    /// Removed from the stack and destroyed on completion (pop, replace).
    Detached(Box<dyn View>),
}

struct Flight {
    transition: Transition,
    outgoing: Outgoing,
    /// False when the outgoing view never received `on_enter`.
    outgoing_entered: bool,
}

// ---------------------------------------------------------------------------
// ViewManager
// ---------------------------------------------------------------------------

/// A stack of views with animated transitions between them.
///
/// The manager is itself a [`Responder`]: it forwards think and draw to the
/// views it owns and applies queued navigation requests from the context
/// after each think.
pub struct ViewManager {
    /// The foreground view. The stack is never empty.
    top: Box<dyn View>,
    /// Views below the top, oldest first.
    below: Vec<Box<dyn View>>,
    flight: Option<Flight>,
    transition_ms: u32,
    back_button: Option<(Switch, Direction)>,
    /// The top view has not received `on_enter` yet.
    pending_enter: bool,
}

impl ViewManager {
    /// Create a manager with `root` as its only view.
    ///
    /// `root.on_enter` runs on the first think.
    pub fn new(root: Box<dyn View>) -> Self {
        Self {
            top: root,
            below: Vec::new(),
            flight: None,
            transition_ms: DEFAULT_TRANSITION_MS,
            back_button: Some((Switch::Os, Direction::Middle)),
            pending_enter: true,
        }
    }

    /// Set the duration of subsequent transitions (builder).
    pub fn with_transition_ms(mut self, ms: u32) -> Self {
        self.transition_ms = ms;
        self
    }

    /// Choose the button that pops the stack, or `None` to disable (builder).
    pub fn with_back_button(mut self, button: Option<(Switch, Direction)>) -> Self {
        self.back_button = button;
        self
    }

    pub fn set_transition_ms(&mut self, ms: u32) {
        self.transition_ms = ms;
    }

    pub fn transition_ms(&self) -> u32 {
        self.transition_ms
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Number of views on the stack, including the top.
    pub fn depth(&self) -> usize {
        self.below.len() + 1
    }

    /// The foreground view (the incoming one during a transition).
    pub fn top(&self) -> &dyn View {
        self.top.as_ref()
    }

    /// The foreground view, downcast to `T`.
    pub fn top_as<T: View + 'static>(&self) -> Option<&T> {
        self.top.as_ref().as_any().downcast_ref::<T>()
    }

    /// The transition in flight, if any.
    pub fn transition(&self) -> Option<&Transition> {
        self.flight.as_ref().map(|f| &f.transition)
    }

    pub fn phase(&self) -> NavPhase {
        match &self.flight {
            None => NavPhase::Idle,
            Some(flight) => flight.transition.phase(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.flight.is_none()
    }

    /// Whether status icons should be drawn over the foreground view.
    pub fn show_icons(&self) -> bool {
        self.top.show_icons()
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Push `view` over the current top.
    pub fn push(&mut self, view: Box<dyn View>, kind: TransitionKind) -> Result<(), NavError> {
        self.ensure_idle()?;
        let previous = mem::replace(&mut self.top, view);
        self.below.push(previous);
        self.begin(kind, Outgoing::Covered);
        debug!(depth = self.depth(), ?kind, "view pushed");
        Ok(())
    }

    /// Pop the top view. On a single-entry stack this does nothing.
    pub fn pop(&mut self, kind: TransitionKind) -> Result<(), NavError> {
        self.ensure_idle()?;
        let Some(revealed) = self.below.pop() else {
            debug!("pop on single-entry stack ignored");
            return Ok(());
        };
        let popped = mem::replace(&mut self.top, revealed);
        self.begin(kind, Outgoing::Detached(popped));
        debug!(depth = self.depth(), ?kind, "view popped");
        Ok(())
    }

    /// Swap the top view for `view` without growing the stack.
    pub fn replace(&mut self, view: Box<dyn View>, kind: TransitionKind) -> Result<(), NavError> {
        self.ensure_idle()?;
        let replaced = mem::replace(&mut self.top, view);
        self.begin(kind, Outgoing::Detached(replaced));
        debug!(depth = self.depth(), ?kind, "view replaced");
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), NavError> {
        match self.flight {
            Some(_) => Err(NavError::TransitionInFlight),
            None => Ok(()),
        }
    }

    fn begin(&mut self, kind: TransitionKind, outgoing: Outgoing) {
        let outgoing_entered = !mem::take(&mut self.pending_enter);
        self.flight = Some(Flight {
            transition: Transition::new(kind, self.transition_ms),
            outgoing,
            outgoing_entered,
        });
    }

    /// Tear down a completed transition.
    fn finish(&mut self, cx: &mut Context) {
        let Some(flight) = self.flight.take() else {
            return;
        };
        if flight.outgoing_entered {
            match flight.outgoing {
                Outgoing::Covered => {
                    if let Some(view) = self.below.last_mut() {
                        view.on_exit(cx);
                    }
                }
                Outgoing::Detached(mut view) => view.on_exit(cx),
            }
        }
        self.top.on_enter(cx);
    }

    /// Apply navigation requests queued on the context.
    fn apply_requests(&mut self, cx: &mut Context) {
        let requests: Vec<NavRequest> = cx.nav.drain().collect();
        for request in requests {
            let result = match request {
                NavRequest::Push(view, kind) => self.push(view, kind),
                NavRequest::Pop(kind) => self.pop(kind),
                NavRequest::Replace(view, kind) => self.replace(view, kind),
            };
            if let Err(err) = result {
                debug!(%err, "navigation request dropped");
            }
        }
    }

    fn back_pressed(&self, input: &InputSnapshot) -> bool {
        self.back_button
            .is_some_and(|(switch, direction)| input.buttons.button(switch, direction).pressed)
    }
}

impl Responder for ViewManager {
    fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        if self.flight.is_none() {
            if mem::take(&mut self.pending_enter) {
                self.top.on_enter(cx);
            }
            if self.back_pressed(input) && !self.below.is_empty() {
                // Idle was checked above, so this cannot fail.
                let _ = self.pop(TransitionKind::SwipeRight);
            }
        }

        let mut complete = false;
        match self.flight.as_mut() {
            Some(flight) => {
                flight.transition.advance(delta_ms);
                let leaving_thinks = flight.transition.leaving_thinks();
                self.top.think(cx, input, delta_ms);
                if leaving_thinks {
                    let quiet = input.without_edges();
                    match &mut flight.outgoing {
                        Outgoing::Covered => {
                            if let Some(view) = self.below.last_mut() {
                                view.think(cx, &quiet, delta_ms);
                            }
                        }
                        Outgoing::Detached(view) => view.think(cx, &quiet, delta_ms),
                    }
                }
                complete = flight.transition.is_complete();
            }
            None => self.top.think(cx, input, delta_ms),
        }
        if complete {
            self.finish(cx);
        }

        self.apply_requests(cx);
    }

    fn draw(&self, g: &mut Graphics) {
        let Some(flight) = &self.flight else {
            g.scoped(|g| self.top.draw(g));
            return;
        };
        let leaving: Option<&dyn View> = match &flight.outgoing {
            Outgoing::Covered => self.below.last().map(|v| v.as_ref()),
            Outgoing::Detached(view) => Some(view.as_ref()),
        };
        match leaving {
            Some(leaving) => flight.transition.draw(g, leaving, self.top.as_ref()),
            None => g.scoped(|g| self.top.draw(g)),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use pretty_assertions::assert_eq;

    type Journal = Rc<RefCell<Vec<String>>>;

    /// Records hooks and thinks into a shared journal.
    struct Probe {
        name: &'static str,
        journal: Journal,
    }

    impl Probe {
        fn boxed(name: &'static str, journal: &Journal) -> Box<dyn View> {
            Box::new(Probe {
                name,
                journal: Rc::clone(journal),
            })
        }

        fn log(&self, what: &str) {
            self.journal.borrow_mut().push(format!("{} {what}", self.name));
        }
    }

    impl Responder for Probe {
        fn think(&mut self, _cx: &mut Context, input: &InputSnapshot, _delta_ms: u32) {
            if input.buttons.app.middle.pressed {
                self.log("saw press");
            } else {
                self.log("think");
            }
        }

        fn draw(&self, g: &mut Graphics) {
            g.text(0.0, 0.0, self.name);
        }
    }

    impl View for Probe {
        fn on_enter(&mut self, _cx: &mut Context) {
            self.log("enter");
        }

        fn on_exit(&mut self, _cx: &mut Context) {
            self.log("exit");
        }

        fn show_icons(&self) -> bool {
            self.name != "full"
        }
    }

    fn take(journal: &Journal) -> Vec<String> {
        journal.borrow_mut().drain(..).collect()
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::idle()
    }

    fn press(switch: Switch, direction: Direction) -> InputSnapshot {
        InputSnapshot::pressing(switch, direction)
    }

    fn manager(journal: &Journal) -> (ViewManager, Context) {
        let mut vm = ViewManager::new(Probe::boxed("a", journal)).with_transition_ms(100);
        let mut cx = Context::new();
        vm.think(&mut cx, &idle(), 20);
        take(journal);
        (vm, cx)
    }

    // ── Stack operations ─────────────────────────────────────────────

    #[test]
    fn root_enters_on_first_think() {
        let journal = Journal::default();
        let mut vm = ViewManager::new(Probe::boxed("a", &journal));
        let mut cx = Context::new();
        vm.think(&mut cx, &idle(), 20);
        vm.think(&mut cx, &idle(), 20);
        assert_eq!(take(&journal), vec!["a enter", "a think", "a think"]);
    }

    #[test]
    fn pop_on_single_entry_is_noop() {
        let journal = Journal::default();
        let (mut vm, _cx) = manager(&journal);
        assert_eq!(vm.pop(TransitionKind::SwipeRight), Ok(()));
        assert_eq!(vm.depth(), 1);
        assert!(vm.is_idle());
    }

    #[test]
    fn push_runs_hooks_on_completion() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft)
            .unwrap();
        assert_eq!(vm.depth(), 2);
        assert_eq!(vm.phase(), NavPhase::Leaving);

        for _ in 0..5 {
            vm.think(&mut cx, &idle(), 20);
        }
        assert!(vm.is_idle());
        assert_eq!(
            take(&journal),
            vec![
                // 20 %, 40 %: both think.
                "b think", "a think", "b think", "a think",
                // 60 %, 80 %: only the incoming view.
                "b think", "b think",
                // 100 %.
                "b think", "a exit", "b enter",
            ]
        );
    }

    #[test]
    fn navigation_in_flight_is_rejected() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.push(Probe::boxed("b", &journal), TransitionKind::Blend)
            .unwrap();
        vm.think(&mut cx, &idle(), 20);
        assert_eq!(
            vm.push(Probe::boxed("c", &journal), TransitionKind::Blend),
            Err(NavError::TransitionInFlight)
        );
        assert_eq!(vm.pop(TransitionKind::Blend), Err(NavError::TransitionInFlight));
        assert_eq!(vm.depth(), 2);
    }

    #[test]
    fn replace_keeps_depth() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.replace(Probe::boxed("b", &journal), TransitionKind::Blend)
            .unwrap();
        for _ in 0..5 {
            vm.think(&mut cx, &idle(), 20);
        }
        assert_eq!(vm.depth(), 1);
        let top = vm.top_as::<Probe>().unwrap();
        assert_eq!(top.name, "b");
    }

    #[test]
    fn zero_duration_completes_on_next_think() {
        let journal = Journal::default();
        let (vm, mut cx) = manager(&journal);
        let mut vm = vm.with_transition_ms(0);
        vm.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft)
            .unwrap();
        vm.think(&mut cx, &idle(), 0);
        assert!(vm.is_idle());
    }

    // ── Input routing ────────────────────────────────────────────────

    #[test]
    fn leaving_view_never_sees_edges() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.push(Probe::boxed("b", &journal), TransitionKind::Blend)
            .unwrap();
        vm.think(&mut cx, &press(Switch::App, Direction::Middle), 20);
        assert_eq!(take(&journal), vec!["b saw press", "a think"]);
    }

    #[test]
    fn back_button_pops() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft)
            .unwrap();
        for _ in 0..5 {
            vm.think(&mut cx, &idle(), 20);
        }
        vm.think(&mut cx, &press(Switch::Os, Direction::Middle), 20);
        assert_eq!(vm.depth(), 1);
        assert_eq!(
            vm.transition().map(|t| t.kind()),
            Some(TransitionKind::SwipeRight)
        );
    }

    #[test]
    fn back_button_can_be_disabled() {
        let journal = Journal::default();
        let (vm, mut cx) = manager(&journal);
        let mut vm = vm.with_back_button(None);
        vm.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft)
            .unwrap();
        for _ in 0..5 {
            vm.think(&mut cx, &idle(), 20);
        }
        vm.think(&mut cx, &press(Switch::Os, Direction::Middle), 20);
        assert_eq!(vm.depth(), 2);
    }

    #[test]
    fn requests_from_context_apply_after_think() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        cx.nav.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft);
        cx.nav.push(Probe::boxed("c", &journal), TransitionKind::SwipeLeft);
        vm.think(&mut cx, &idle(), 20);
        // The second request hit an in-flight transition and was dropped.
        assert_eq!(vm.depth(), 2);
        assert!(cx.nav.is_empty());
    }

    #[test]
    fn show_icons_follows_top() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        assert!(vm.show_icons());
        vm.push(Probe::boxed("full", &journal), TransitionKind::Blend)
            .unwrap();
        vm.think(&mut cx, &idle(), 20);
        assert!(!vm.show_icons());
    }

    // ── Drawing ──────────────────────────────────────────────────────

    #[test]
    fn draws_both_views_mid_transition() {
        let journal = Journal::default();
        let (mut vm, mut cx) = manager(&journal);
        vm.push(Probe::boxed("b", &journal), TransitionKind::SwipeLeft)
            .unwrap();
        vm.think(&mut cx, &idle(), 50);
        let mut g = Graphics::new();
        vm.draw(&mut g);
        insta::assert_snapshot!(g.finish().to_string().trim_end(), @r#"
        text -120.0,0.0 s20.0 #ffffff a1.00 "a"
        text 120.0,0.0 s20.0 #ffffff a1.00 "b"
        "#);
    }
}
