//! Pilot: a headless reactor driven tick by tick.
//!
//! The `Pilot` owns a [`Reactor`] wired to a [`ManualInput`] and the
//! receiving end of the frame pipeline. Tests flip switches and petals,
//! advance simulated time explicitly, and inspect the frames drawn.

use std::time::Duration;

use tokio::time::Instant;

use crate::context::Context;
use crate::graphics::{frame_pipeline, CharGrid, DrawList, FrameReceiver};
use crate::input::{Direction, ManualInput, Switch, SwitchPosition};
use crate::reactor::{Reactor, ReactorConfig, ReactorStats, TickReport};
use crate::responder::Responder;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless reactor for tests.
///
/// # Examples
///
/// ```
/// use petal_ui::graphics::Graphics;
/// use petal_ui::input::{Direction, Switch};
/// use petal_ui::responder::FnView;
/// use petal_ui::testing::Pilot;
///
/// let mut pilot = Pilot::new(FnView::new(|g: &mut Graphics| {
///     g.text(0.0, 0.0, "hello");
/// }));
/// pilot.press(Switch::App, Direction::Middle);
/// assert_eq!(pilot.last_frame().unwrap().texts().next(), Some("hello"));
/// ```
pub struct Pilot {
    reactor: Reactor,
    input: ManualInput,
    frames: FrameReceiver,
    now: Instant,
    started: bool,
    display_stalled: bool,
    last_frame: Option<DrawList>,
}

impl Pilot {
    /// Drive `top` with the default config.
    pub fn new(top: impl Responder + 'static) -> Self {
        Self::with_config(ReactorConfig::default(), top)
    }

    /// Drive `top` with `config`.
    pub fn with_config(config: ReactorConfig, top: impl Responder + 'static) -> Self {
        let input = ManualInput::new();
        let (tx, frames) = frame_pipeline();
        let mut reactor = Reactor::new(config, input.clone(), tx);
        reactor.set_top(Box::new(top));
        Self {
            reactor,
            input,
            frames,
            now: Instant::now(),
            started: false,
            display_stalled: false,
            last_frame: None,
        }
    }

    /// Replace the reactor's context (builder).
    pub fn with_context(mut self, cx: Context) -> Self {
        self.reactor = self.reactor.with_context(cx);
        self
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Hold a switch in `direction` until released.
    pub fn hold(&mut self, switch: Switch, direction: Direction) {
        let position = match direction {
            Direction::Left => SwitchPosition::Left,
            Direction::Middle => SwitchPosition::Middle,
            Direction::Right => SwitchPosition::Right,
        };
        self.input.hold(switch, position);
    }

    pub fn release(&mut self, switch: Switch) {
        self.input.release(switch);
    }

    /// Hold for one tick, then release for one tick.
    pub fn press(&mut self, switch: Switch, direction: Direction) {
        self.hold(switch, direction);
        self.tick();
        self.release(switch);
        self.tick();
    }

    pub fn touch(&mut self, petal: usize, rad: f32, phi: f32) {
        self.input.touch(petal, rad, phi);
    }

    pub fn lift(&mut self, petal: usize) {
        self.input.lift(petal);
    }

    /// The shared input handle.
    pub fn input(&self) -> &ManualInput {
        &self.input
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Run one tick of the configured interval.
    pub fn tick(&mut self) -> TickReport {
        let tick_ms = self.reactor.config().tick_ms;
        self.advance(tick_ms)
    }

    /// Run `n` ticks, returning the last report.
    pub fn tick_n(&mut self, n: usize) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..n {
            report = self.tick();
        }
        report
    }

    /// Run one tick `delta_ms` after the previous one. The very first tick
    /// always reports the configured interval.
    pub fn advance(&mut self, delta_ms: u32) -> TickReport {
        if self.started {
            self.now += Duration::from_millis(u64::from(delta_ms));
        }
        self.started = true;
        let report = self.reactor.tick(self.now);
        if !self.display_stalled {
            self.flip();
        }
        report
    }

    // ── Display ──────────────────────────────────────────────────────

    /// While stalled, frames stay in the pipeline and the reactor sees
    /// backpressure.
    pub fn stall_display(&mut self, stalled: bool) {
        self.display_stalled = stalled;
        if !stalled {
            self.flip();
        }
    }

    fn flip(&mut self) {
        if let Some(frame) = self.frames.try_next() {
            self.last_frame = Some(frame.draw_list().clone());
        }
    }

    /// The most recently flipped frame.
    pub fn last_frame(&self) -> Option<&DrawList> {
        self.last_frame.as_ref()
    }

    /// The most recently flipped frame rasterized to text.
    pub fn screen(&self, cols: usize, rows: usize) -> String {
        self.last_frame
            .as_ref()
            .map(|list| CharGrid::rasterize(list, cols, rows).to_string())
            .unwrap_or_default()
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn reactor_mut(&mut self) -> &mut Reactor {
        &mut self.reactor
    }

    pub fn context(&self) -> &Context {
        self.reactor.context()
    }

    pub fn context_mut(&mut self) -> &mut Context {
        self.reactor.context_mut()
    }

    pub fn stats(&self) -> &ReactorStats {
        self.reactor.stats()
    }

    /// The top responder, downcast to `T`.
    pub fn top_as<T: Responder + 'static>(&self) -> Option<&T> {
        self.reactor.top_as::<T>()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
