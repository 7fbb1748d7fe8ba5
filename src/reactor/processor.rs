//! Background processors: per-tick controllers not tied to any view.

use tracing::debug;

use crate::context::Context;
use crate::hal::{Rgb, MAX_VOLUME_DB};
use crate::input::{InputSnapshot, RepeatSettings, Repeater};

/// Runs every tick before the top responder thinks.
pub trait Processor {
    fn process(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32);
}

// ---------------------------------------------------------------------------
// VolumeProcessor
// ---------------------------------------------------------------------------

/// Volume control on the OS switch's left and right buttons.
///
/// Each step moves the volume by [`STEP_DB`](Self::STEP_DB). The volume
/// never rests below [`FLOOR_DB`](Self::FLOOR_DB); stepping down from the
/// floor mutes instead. Any step up unmutes, and when muted that is all it
/// does. The resulting level is mirrored on the LED ring.
#[derive(Debug, Clone)]
pub struct VolumeProcessor {
    down: Repeater,
    up: Repeater,
    mirror_on_leds: bool,
}

impl VolumeProcessor {
    pub const STEP_DB: f32 = 5.0;
    pub const FLOOR_DB: f32 = -20.0;
    const LEVEL_COLOR: Rgb = Rgb::new(0, 90, 160);
    const MUTED_COLOR: Rgb = Rgb::new(80, 0, 0);

    pub fn new(repeat: RepeatSettings) -> Self {
        Self {
            down: Repeater::new(repeat),
            up: Repeater::new(repeat),
            mirror_on_leds: true,
        }
    }

    /// Leave the LED ring alone (builder).
    pub fn without_led_mirror(mut self) -> Self {
        self.mirror_on_leds = false;
        self
    }

    fn mirror(&self, cx: &mut Context) {
        let len = cx.leds.len();
        if !self.mirror_on_leds || len == 0 {
            return;
        }
        if cx.audio.muted() {
            cx.leds.set_all(Rgb::OFF);
            cx.leds.set(0, Self::MUTED_COLOR);
        } else {
            let span = MAX_VOLUME_DB - Self::FLOOR_DB;
            let level = ((cx.audio.volume_db() - Self::FLOOR_DB) / span).clamp(0.0, 1.0);
            let lit = ((level * len as f32).round() as usize).max(1);
            for index in 0..len {
                let color = if index < lit {
                    Self::LEVEL_COLOR
                } else {
                    Rgb::OFF
                };
                cx.leds.set(index, color);
            }
        }
        cx.leds.flush();
    }
}

impl Default for VolumeProcessor {
    fn default() -> Self {
        Self::new(RepeatSettings::default())
    }
}

impl Processor for VolumeProcessor {
    fn process(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32) {
        let os = &input.buttons.os;
        let step_down = self.down.update(&os.left, delta_ms).is_some();
        let step_up = self.up.update(&os.right, delta_ms).is_some();
        if !step_down && !step_up {
            return;
        }

        let mut mute = false;
        if step_down {
            if cx.audio.volume_db() <= Self::FLOOR_DB {
                mute = true;
            }
            cx.audio.adjust_volume_db(-Self::STEP_DB);
        }
        if step_up && !cx.audio.muted() {
            cx.audio.adjust_volume_db(Self::STEP_DB);
        }
        if cx.audio.volume_db() < Self::FLOOR_DB {
            cx.audio.set_volume_db(Self::FLOOR_DB);
        }
        cx.audio.set_muted(mute);
        debug!(volume_db = cx.audio.volume_db(), muted = mute, "volume changed");
        self.mirror(cx);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
