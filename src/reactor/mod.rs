//! The reactor: a fixed-cadence cooperative scheduler.
//!
//! Every tick the [`Reactor`] gathers one [`InputSnapshot`], runs the event
//! registry and the background [`Processor`]s, lets the top responder think,
//! and, unless the display is still busy with the previous frame, draws a
//! new frame into the pipeline. Ticks never overlap and are never made up:
//! a slow tick is logged and the next `delta_ms` simply reflects it.

pub mod config;
pub mod processor;
pub mod stats;

pub use config::ReactorConfig;
pub use processor::{Processor, VolumeProcessor};
pub use stats::ReactorStats;

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, trace, warn};

use crate::context::Context;
use crate::graphics::{FrameSender, Graphics, PipelineError};
use crate::input::{InputGatherer, InputSnapshot, InputSource};
use crate::responder::Responder;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Milliseconds since the previous tick.
    pub delta_ms: u32,
    /// A frame was handed to the pipeline.
    pub drew: bool,
    /// Drawing was skipped because the previous frame was still in flight.
    pub skipped: bool,
    /// Processing took longer than the tick interval.
    pub overrun: bool,
    /// A responder or processor panicked and the tick was cut short.
    pub failed: bool,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

// ---------------------------------------------------------------------------
// Reactor
// ---------------------------------------------------------------------------

/// Drives one top responder at a fixed tick rate.
pub struct Reactor {
    config: ReactorConfig,
    source: Box<dyn InputSource>,
    gatherer: InputGatherer,
    frames: FrameSender,
    top: Option<Box<dyn Responder>>,
    processors: Vec<Box<dyn Processor>>,
    cx: Context,
    graphics: Graphics,
    last_tick: Option<Instant>,
    last_frame: Option<Instant>,
}

impl Reactor {
    /// Create a reactor reading from `source` and drawing into `frames`.
    pub fn new(
        config: ReactorConfig,
        source: impl InputSource + 'static,
        frames: FrameSender,
    ) -> Self {
        let mut config = config;
        // Deserialized configs bypass `with_tick_ms`.
        config.tick_ms = config.tick_ms.max(1);
        let mut gatherer = InputGatherer::new();
        gatherer.set_buttons_swapped(config.swap_buttons);
        Self {
            config,
            source: Box::new(source),
            gatherer,
            frames,
            top: None,
            processors: Vec::new(),
            cx: Context::new(),
            graphics: Graphics::new(),
            last_tick: None,
            last_frame: None,
        }
    }

    /// Replace the context, e.g. to install real actuators (builder).
    pub fn with_context(mut self, cx: Context) -> Self {
        self.cx = cx;
        self
    }

    /// Set the top responder. May be called while running.
    pub fn set_top(&mut self, top: Box<dyn Responder>) {
        self.top = Some(top);
    }

    pub fn top(&self) -> Option<&dyn Responder> {
        self.top.as_deref()
    }

    /// The top responder, downcast to `T`.
    pub fn top_as<T: Responder + 'static>(&self) -> Option<&T> {
        self.top.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Add a processor. Processors run in insertion order.
    pub fn add_processor(&mut self, processor: impl Processor + 'static) {
        self.processors.push(Box::new(processor));
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.cx
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn stats(&self) -> &ReactorStats {
        &self.cx.stats
    }

    pub fn set_buttons_swapped(&mut self, swapped: bool) {
        self.config.swap_buttons = swapped;
        self.gatherer.set_buttons_swapped(swapped);
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Run one tick as if it started at `now`.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let started = Instant::now();
        let delta_ms = match self.last_tick {
            Some(last) => {
                let ms = now.saturating_duration_since(last).as_millis();
                u32::try_from(ms).unwrap_or(u32::MAX)
            }
            None => self.config.tick_ms,
        };
        self.last_tick = Some(now);
        self.cx.stats.ticks += 1;

        let mut report = TickReport {
            delta_ms,
            ..TickReport::default()
        };

        let raw = self.source.sample();
        let input = self.gatherer.gather(raw, delta_ms);

        if self.think(&input, delta_ms) {
            self.draw(now, &mut report);
        } else {
            report.failed = true;
            self.cx.stats.failures += 1;
        }

        let run_ms = started.elapsed().as_millis();
        let run_ms = u32::try_from(run_ms).unwrap_or(u32::MAX);
        self.cx.stats.record_run_time(run_ms);
        if run_ms > self.config.tick_ms {
            report.overrun = true;
            self.cx.stats.overruns += 1;
            warn!(run_ms, tick_ms = self.config.tick_ms, "tick overran");
        }
        trace!(?report, "tick");
        report
    }

    /// Input pump, timers, processors and the top think. Returns `false`
    /// if any of them panicked.
    fn think(&mut self, input: &InputSnapshot, delta_ms: u32) -> bool {
        let cx = &mut self.cx;
        let processors = &mut self.processors;
        let top = &mut self.top;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            cx.events.pump_input(input);
            cx.events.advance_timers(delta_ms);
            for processor in processors.iter_mut() {
                processor.process(cx, input, delta_ms);
            }
            if let Some(top) = top.as_mut() {
                top.think(cx, input, delta_ms);
            }
        }));
        if !self.cx.nav.is_empty() {
            let dropped = self.cx.nav.drain().count();
            debug!(dropped, "navigation requests with no view manager dropped");
        }
        match outcome {
            Ok(()) => true,
            Err(payload) => {
                error!(panic = panic_message(payload.as_ref()), "think panicked");
                false
            }
        }
    }

    fn draw(&mut self, now: Instant, report: &mut TickReport) {
        let Some(top) = self.top.as_ref() else {
            return;
        };
        if self.frames.is_backpressured() {
            report.skipped = true;
            self.cx.stats.frames_skipped += 1;
            trace!("display busy, draw skipped");
            return;
        }

        let graphics = &mut self.graphics;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            graphics.scoped(|g| top.draw(g));
        }));
        let list = self.graphics.finish();
        if let Err(payload) = outcome {
            error!(panic = panic_message(payload.as_ref()), "draw panicked");
            report.failed = true;
            self.cx.stats.failures += 1;
            return;
        }

        match self.frames.submit(list) {
            Ok(()) => {
                report.drew = true;
                self.cx.stats.frames_drawn += 1;
                if let Some(last) = self.last_frame {
                    let ms = now.saturating_duration_since(last).as_millis();
                    self.cx
                        .stats
                        .record_render_interval(u32::try_from(ms).unwrap_or(u32::MAX));
                }
                self.last_frame = Some(now);
            }
            Err(PipelineError::Backpressured) => {
                report.skipped = true;
                self.cx.stats.frames_skipped += 1;
            }
            Err(err @ PipelineError::Closed) => {
                report.skipped = true;
                self.cx.stats.frames_skipped += 1;
                debug!(%err, "frame dropped");
            }
        }
    }

    // ── Running ──────────────────────────────────────────────────────

    /// Tick forever.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Tick at the configured interval until `signal` resolves.
    ///
    /// Late ticks are delayed rather than bursted to catch up.
    pub async fn run_until<F: Future>(&mut self, signal: F) {
        let period = Duration::from_millis(u64::from(self.config.tick_ms.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(signal);
        loop {
            tokio::select! {
                biased;
                _ = &mut signal => break,
                _ = interval.tick() => {
                    self.tick(Instant::now());
                }
            }
        }
        debug!(ticks = self.cx.stats.ticks, "reactor stopped");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
