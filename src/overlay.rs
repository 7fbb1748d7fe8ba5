//! Overlays drawn above the main responder.
//!
//! The [`Compositor`] is itself a [`Responder`]: install it as the reactor's
//! top and it forwards think and draw to the main responder, then to every
//! overlay whose [`OverlayKind`] is enabled.

use tracing::debug;

use crate::context::Context;
use crate::graphics::{Color, Graphics};
use crate::input::InputSnapshot;
use crate::nav::ViewManager;
use crate::responder::Responder;

/// Overlay families that can be switched on and off together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Status icons such as volume.
    Indicators,
    /// Timing statistics.
    Debug,
}

impl OverlayKind {
    fn bit(self) -> u8 {
        match self {
            OverlayKind::Indicators => 1,
            OverlayKind::Debug => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// Draws a main responder with overlays on top.
pub struct Compositor {
    main: Box<dyn Responder>,
    overlays: Vec<(OverlayKind, Box<dyn Responder>)>,
    enabled: u8,
}

impl Compositor {
    /// Wrap `main`. Indicators start enabled, debug starts disabled.
    pub fn new(main: Box<dyn Responder>) -> Self {
        Self {
            main,
            overlays: Vec::new(),
            enabled: OverlayKind::Indicators.bit(),
        }
    }

    /// Add an overlay (builder). Overlays draw in insertion order.
    pub fn with_overlay(mut self, kind: OverlayKind, overlay: impl Responder + 'static) -> Self {
        self.add_overlay(kind, overlay);
        self
    }

    pub fn add_overlay(&mut self, kind: OverlayKind, overlay: impl Responder + 'static) {
        self.overlays.push((kind, Box::new(overlay)));
    }

    pub fn set_enabled(&mut self, kind: OverlayKind, enabled: bool) {
        if enabled {
            self.enabled |= kind.bit();
        } else {
            self.enabled &= !kind.bit();
        }
        debug!(?kind, enabled, "overlay toggled");
    }

    pub fn is_enabled(&self, kind: OverlayKind) -> bool {
        self.enabled & kind.bit() != 0
    }

    pub fn main(&self) -> &dyn Responder {
        self.main.as_ref()
    }

    /// The main responder, downcast to `T`.
    pub fn main_as<T: Responder + 'static>(&self) -> Option<&T> {
        self.main.as_ref().as_any().downcast_ref::<T>()
    }

    pub fn main_as_mut<T: Responder + 'static>(&mut self) -> Option<&mut T> {
        self.main.as_mut().as_any_mut().downcast_mut::<T>()
    }

    /// Whether overlays of `kind` draw this frame. A view manager whose
    /// top view hides icons also hides the indicators.
    fn visible(&self, kind: OverlayKind) -> bool {
        if !self.is_enabled(kind) {
            return false;
        }
        match kind {
            OverlayKind::Indicators => self
                .main_as::<ViewManager>()
                .map_or(true, ViewManager::show_icons),
            OverlayKind::Debug => true,
        }
    }
}

impl Responder for Compositor {
    fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        self.main.think(cx, input, delta_ms);
        for (_, overlay) in &mut self.overlays {
            overlay.think(cx, input, delta_ms);
        }
    }

    fn draw(&self, g: &mut Graphics) {
        g.scoped(|g| self.main.draw(g));
        for (kind, overlay) in &self.overlays {
            if self.visible(*kind) {
                g.scoped(|g| overlay.draw(g));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DebugOverlay
// ---------------------------------------------------------------------------

/// Average tick time and frame rate along the bottom edge.
#[derive(Debug, Clone, Default)]
pub struct DebugOverlay {
    tick_ms: Option<f32>,
    fps: Option<f32>,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The line of text this overlay draws.
    pub fn line(&self) -> String {
        let tick = self
            .tick_ms
            .map_or_else(|| "--".to_owned(), |ms| format!("{ms:.1}"));
        let fps = self
            .fps
            .map_or_else(|| "--".to_owned(), |fps| format!("{fps:.0}"));
        format!("{tick}ms {fps}fps")
    }
}

impl Responder for DebugOverlay {
    fn think(&mut self, cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {
        self.tick_ms = cx.stats.average_tick_ms();
        self.fps = cx.stats.fps();
    }

    fn draw(&self, g: &mut Graphics) {
        g.font_size(12.0)
            .color(Color::rgb(0.0, 1.0, 0.0))
            .text_centered(0.0, 96.0, self.line());
    }
}

// ---------------------------------------------------------------------------
// IndicatorsOverlay
// ---------------------------------------------------------------------------

/// Volume indicator along the top edge.
#[derive(Debug, Clone, Default)]
pub struct IndicatorsOverlay {
    volume_db: f32,
    muted: bool,
}

impl IndicatorsOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self) -> String {
        if self.muted {
            "mute".to_owned()
        } else {
            format!("{:+.0}dB", self.volume_db)
        }
    }
}

impl Responder for IndicatorsOverlay {
    fn think(&mut self, cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {
        self.volume_db = cx.audio.volume_db();
        self.muted = cx.audio.muted();
    }

    fn draw(&self, g: &mut Graphics) {
        g.font_size(12.0).gray(0.8).text_centered(0.0, -108.0, self.label());
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MemoryAudio;
    use crate::responder::{FnView, View};

    struct Plain(&'static str);

    impl Responder for Plain {
        fn think(&mut self, _cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {}

        fn draw(&self, g: &mut Graphics) {
            g.text(0.0, 0.0, self.0);
        }
    }

    struct Fullscreen;

    impl Responder for Fullscreen {
        fn think(&mut self, _cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {}

        fn draw(&self, g: &mut Graphics) {
            g.text(0.0, 0.0, "video");
        }
    }

    impl View for Fullscreen {
        fn show_icons(&self) -> bool {
            false
        }
    }

    fn texts(c: &Compositor) -> Vec<String> {
        let mut g = Graphics::new();
        c.draw(&mut g);
        g.finish().texts().map(str::to_owned).collect()
    }

    // ── Compositor ───────────────────────────────────────────────────

    #[test]
    fn overlays_follow_their_kind() {
        let mut c = Compositor::new(Box::new(Plain("main")))
            .with_overlay(OverlayKind::Indicators, Plain("icons"))
            .with_overlay(OverlayKind::Debug, Plain("debug"));
        assert_eq!(texts(&c), vec!["main", "icons"]);

        c.set_enabled(OverlayKind::Debug, true);
        c.set_enabled(OverlayKind::Indicators, false);
        assert_eq!(texts(&c), vec!["main", "debug"]);
    }

    #[test]
    fn views_can_hide_indicators() {
        let vm = ViewManager::new(Box::new(Fullscreen));
        let c = Compositor::new(Box::new(vm)).with_overlay(OverlayKind::Indicators, Plain("icons"));
        assert_eq!(texts(&c), vec!["video"]);

        let vm = ViewManager::new(Box::new(FnView::new(|g: &mut Graphics| {
            g.text(0.0, 0.0, "menu");
        })));
        let c = Compositor::new(Box::new(vm)).with_overlay(OverlayKind::Indicators, Plain("icons"));
        assert_eq!(texts(&c), vec!["menu", "icons"]);
    }

    #[test]
    fn main_downcasts() {
        let c = Compositor::new(Box::new(Plain("main")));
        assert!(c.main_as::<Plain>().is_some());
        assert!(c.main_as::<ViewManager>().is_none());
    }

    // ── Built-in overlays ────────────────────────────────────────────

    #[test]
    fn debug_overlay_reads_stats() {
        let mut cx = Context::new();
        let mut overlay = DebugOverlay::new();
        overlay.think(&mut cx, &InputSnapshot::idle(), 20);
        assert_eq!(overlay.line(), "--ms --fps");

        cx.stats.record_run_time(3);
        cx.stats.record_render_interval(20);
        overlay.think(&mut cx, &InputSnapshot::idle(), 20);
        assert_eq!(overlay.line(), "3.0ms 50fps");
    }

    #[test]
    fn indicators_show_volume() {
        let mut cx = Context::new().with_audio(MemoryAudio::new(-5.0));
        let mut overlay = IndicatorsOverlay::new();
        overlay.think(&mut cx, &InputSnapshot::idle(), 20);
        assert_eq!(overlay.label(), "-5dB");

        cx.audio.set_muted(true);
        overlay.think(&mut cx, &InputSnapshot::idle(), 20);
        let mut g = Graphics::new();
        overlay.draw(&mut g);
        insta::assert_snapshot!(g.finish().to_string().trim_end(), @r#"text -14.4,-108.0 s12.0 #cccccc a1.00 "mute""#);
    }
}
