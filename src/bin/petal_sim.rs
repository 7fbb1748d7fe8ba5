//! Terminal simulator for the badge UI.
//!
//! Keys: `a` `s` `d` work the app switch, `z` `x` `c` (or the arrow keys)
//! the OS switch, `0`..`9` touch a petal and `,` `.` drag it. `q` quits.
//! Logs go to `petal-sim.log`; set `RUST_LOG` to change the level.

use std::cell::Cell;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use petal_ui::event::{Condition, Event, GroupId, Payload, Sequencer};
use petal_ui::graphics::{frame_pipeline, run_display, TerminalDisplay};
use petal_ui::hal::{
    JsonFileStore, LedBuffer, MemoryAudio, Rgb, SettingsError, SettingsStore, LED_COUNT,
};
use petal_ui::input::{TerminalInput, PETAL_COUNT};
use petal_ui::menu::MenuController;
use petal_ui::overlay::{Compositor, DebugOverlay, IndicatorsOverlay, OverlayKind};
use petal_ui::prelude::*;
use petal_ui::reactor::VolumeProcessor;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "petal-sim.log";
const SETTINGS_FILE: &str = "petal-settings.json";

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error("terminal: {0}")]
    Io(#[from] io::Error),
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),
}

fn to_color(rgb: Rgb, brightness: f32) -> Color {
    let channel = |c: u8| f32::from(c) / 255.0 * brightness;
    Color::rgb(channel(rgb.r), channel(rgb.g), channel(rgb.b))
}

// ---------------------------------------------------------------------------
// Metronome
// ---------------------------------------------------------------------------

/// Flashes the LED ring on every beat. App left/right change the tempo.
struct Metronome {
    bpm: f32,
    beats: Rc<Cell<u32>>,
    seen: u32,
    flash_ms: u32,
    group: Option<GroupId>,
}

impl Metronome {
    const MIN_BPM: f32 = 40.0;
    const MAX_BPM: f32 = 240.0;
    const FLASH_MS: u32 = 80;

    fn new(bpm: f32) -> Self {
        Self {
            bpm,
            beats: Rc::new(Cell::new(0)),
            seen: 0,
            flash_ms: 0,
            group: None,
        }
    }

    fn start(&mut self, cx: &mut Context) {
        let group = cx.events.new_group();
        match Sequencer::new("metronome", self.bpm, 1.0, 1.0) {
            Ok(timer) => {
                cx.events.add_timer(timer.steps(4).group(group));
            }
            Err(err) => warn!(%err, bpm = self.bpm, "metronome not started"),
        }
        let beats = Rc::clone(&self.beats);
        let condition = Condition::kind("timer").and(Condition::field_eq("name", "metronome"));
        cx.events.register(
            Event::new("metronome-beat", condition, move |_: &Payload| {
                beats.set(beats.get() + 1);
            })
            .group(group),
        );
        self.group = Some(group);
    }

    fn stop(&mut self, cx: &mut Context) {
        if let Some(group) = self.group.take() {
            cx.events.remove_group(group);
        }
        cx.leds.set_all(Rgb::OFF);
        cx.leds.flush();
    }

    fn retempo(&mut self, cx: &mut Context, delta: f32) {
        let bpm = (self.bpm + delta).clamp(Self::MIN_BPM, Self::MAX_BPM);
        if bpm == self.bpm {
            return;
        }
        self.bpm = bpm;
        self.stop(cx);
        self.start(cx);
        debug!(bpm, "tempo changed");
    }
}

impl Responder for Metronome {
    fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        if input.buttons.app.left.pressed {
            self.retempo(cx, -10.0);
        }
        if input.buttons.app.right.pressed {
            self.retempo(cx, 10.0);
        }

        let beats = self.beats.get();
        if beats != self.seen {
            self.seen = beats;
            self.flash_ms = Self::FLASH_MS;
            let color = if beats % 4 == 1 {
                Rgb::new(255, 120, 0)
            } else {
                Rgb::new(0, 160, 255)
            };
            cx.leds.set_all(Rgb::OFF);
            cx.leds
                .highlight_petal(beats as usize % PETAL_COUNT, color, LED_COUNT / PETAL_COUNT);
            cx.leds.flush();
        } else if self.flash_ms > 0 {
            self.flash_ms = self.flash_ms.saturating_sub(delta_ms);
            if self.flash_ms == 0 {
                cx.leds.set_all(Rgb::OFF);
                cx.leds.flush();
            }
        }
    }

    fn draw(&self, g: &mut Graphics) {
        g.gray(0.0).clear();
        let pulse = self.flash_ms as f32 / Self::FLASH_MS as f32;
        g.gray(0.3 + 0.7 * pulse).circle(0.0, 0.0, 30.0 + 20.0 * pulse);
        g.gray(1.0)
            .font_size(20.0)
            .text_centered(0.0, 90.0, format!("{:.0} bpm", self.bpm));
    }
}

impl View for Metronome {
    fn on_enter(&mut self, cx: &mut Context) {
        self.start(cx);
    }

    fn on_exit(&mut self, cx: &mut Context) {
        self.stop(cx);
    }
}

// ---------------------------------------------------------------------------
// LedRow
// ---------------------------------------------------------------------------

/// The LED ring, unrolled into a row along the bottom edge.
struct LedRow {
    colors: Vec<Rgb>,
    brightness: f32,
}

impl LedRow {
    fn new(brightness_percent: u8) -> Self {
        Self {
            colors: Vec::new(),
            brightness: f32::from(brightness_percent.min(100)) / 100.0,
        }
    }
}

impl Responder for LedRow {
    fn think(&mut self, cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {
        self.colors.clear();
        self.colors
            .extend((0..cx.leds.len()).map(|i| cx.leds.get(i).unwrap_or(Rgb::OFF)));
    }

    fn draw(&self, g: &mut Graphics) {
        if self.colors.is_empty() {
            return;
        }
        let width = 234.0 / self.colors.len() as f32;
        for (i, &rgb) in self.colors.iter().enumerate() {
            if rgb == Rgb::OFF {
                continue;
            }
            g.color(to_color(rgb, self.brightness))
                .rectangle(-117.0 + i as f32 * width, 110.0, width, 8.0);
        }
    }
}

// ---------------------------------------------------------------------------
// Menus
// ---------------------------------------------------------------------------

fn sun_menu(config: &ReactorConfig) -> Box<dyn View> {
    let items: Vec<Box<dyn MenuItem>> = vec![
        Box::new(MenuItemNoop::new("Sunrise")),
        Box::new(MenuItemNoop::new("Noon")),
        Box::new(MenuItemNoop::new("Sunset")),
        Box::new(MenuItemBack),
    ];
    let controller = MenuController::new(items).with_repeat(config.repeat);
    Box::new(Menu::with_controller(controller, SunLayout::new()))
}

fn ring_menu(config: &ReactorConfig) -> Box<dyn View> {
    let items: Vec<Box<dyn MenuItem>> = vec![
        Box::new(MenuItemNoop::new("One")),
        Box::new(MenuItemNoop::new("Two")),
        Box::new(MenuItemNoop::new("Three")),
        Box::new(MenuItemNoop::new("Four")),
        Box::new(MenuItemBack),
    ];
    let scroller = config.gesture_scroller(items.len(), 0);
    let controller = MenuController::with_scroller(items, scroller).with_repeat(config.repeat);
    Box::new(Menu::with_controller(controller, RingLayout::new("petal 0")))
}

fn main_menu(config: &ReactorConfig) -> Box<dyn View> {
    let sun = config.clone();
    let ring = config.clone();
    let items: Vec<Box<dyn MenuItem>> = vec![
        Box::new(MenuItemForeground::new("Metronome", || {
            Box::new(Metronome::new(120.0)) as Box<dyn View>
        })),
        Box::new(MenuItemForeground::new("Sun menu", move || sun_menu(&sun))),
        Box::new(MenuItemForeground::new("Ring menu", move || ring_menu(&ring))),
        Box::new(MenuItemAction::new("Say hello", || info!("hello from the menu"))),
        Box::new(MenuItemNoop::new("petal-ui")),
    ];
    let controller = MenuController::new(items).with_repeat(config.repeat);
    Box::new(Menu::with_controller(controller, ListLayout))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging() -> io::Result<()> {
    let file = File::create(LOG_FILE)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    std::panic::set_hook(Box::new(|info| {
        error!(%info, "panic");
    }));
    Ok(())
}

fn settings_path() -> PathBuf {
    std::env::var_os("PETAL_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

async fn simulate() -> Result<(), SimError> {
    let mut store = JsonFileStore::new(settings_path());
    let mut settings = store.load_all();
    let config = ReactorConfig::new().with_settings(&settings);
    info!(?config, "starting simulator");

    let quit = Arc::new(Notify::new());
    let mut input = TerminalInput::new(Arc::clone(&quit));
    let mut display = TerminalDisplay::new();
    display.enter()?;
    match input.enable_release_events() {
        Ok(enabled) => debug!(enabled, "key release events"),
        Err(err) => warn!(%err, "could not query keyboard enhancement"),
    }

    let (frames, receiver) = frame_pipeline();
    let cx = Context::new()
        .with_audio(MemoryAudio::new(settings.volume_db))
        .with_leds(LedBuffer::new(LED_COUNT));
    let mut compositor = Compositor::new(Box::new(config.view_manager(main_menu(&config))))
        .with_overlay(OverlayKind::Indicators, IndicatorsOverlay::new())
        .with_overlay(OverlayKind::Indicators, LedRow::new(settings.led_brightness))
        .with_overlay(OverlayKind::Debug, DebugOverlay::new());
    compositor.set_enabled(OverlayKind::Debug, settings.show_debug_overlay);

    let mut reactor = Reactor::new(config.clone(), input, frames).with_context(cx);
    reactor.set_top(Box::new(compositor));
    reactor.add_processor(VolumeProcessor::new(config.repeat));

    let display_task = tokio::task::spawn_local(run_display(receiver, display));
    reactor.run_until(quit.notified()).await;

    let stats = reactor.stats();
    info!(
        ticks = stats.ticks,
        drawn = stats.frames_drawn,
        skipped = stats.frames_skipped,
        overruns = stats.overruns,
        failures = stats.failures,
        "simulator stopped"
    );
    settings.volume_db = reactor.context().audio.volume_db();
    // Dropping the reactor closes the pipeline and ends the display task.
    drop(reactor);
    let mut display = match display_task.await {
        Ok(display) => display,
        Err(err) => {
            error!(%err, "display task failed");
            TerminalDisplay::new()
        }
    };
    display.leave()?;

    store.save_all(&settings)?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = init_logging() {
        eprintln!("petal-sim: cannot open {LOG_FILE}: {err}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("petal-sim: {err}");
            return ExitCode::FAILURE;
        }
    };
    let local = tokio::task::LocalSet::new();
    match local.block_on(&runtime, simulate()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulator failed");
            eprintln!("petal-sim: {err}");
            ExitCode::FAILURE
        }
    }
}
