//! Audio output control.

use tracing::trace;

/// Lowest volume the hardware accepts, in dB.
pub const MIN_VOLUME_DB: f32 = -47.0;
/// Highest volume the hardware accepts, in dB.
pub const MAX_VOLUME_DB: f32 = 14.0;

/// System volume and mute state.
pub trait Audio {
    /// Current volume in dB.
    fn volume_db(&self) -> f32;

    /// Set the volume. Implementations clamp to their supported range.
    fn set_volume_db(&mut self, db: f32);

    /// Change the volume by `delta` dB and return the resulting volume.
    fn adjust_volume_db(&mut self, delta: f32) -> f32 {
        let target = self.volume_db() + delta;
        self.set_volume_db(target);
        self.volume_db()
    }

    fn muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);
}

/// Stand-in for missing audio hardware: neutral values, writes ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl Audio for NullAudio {
    fn volume_db(&self) -> f32 {
        0.0
    }

    fn set_volume_db(&mut self, _db: f32) {}

    fn muted(&self) -> bool {
        false
    }

    fn set_muted(&mut self, _muted: bool) {}
}

/// In-memory audio state, used by the simulator and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryAudio {
    volume_db: f32,
    muted: bool,
}

impl MemoryAudio {
    /// Start at `volume_db`, unmuted.
    pub fn new(volume_db: f32) -> Self {
        Self {
            volume_db: clamp_volume(volume_db),
            muted: false,
        }
    }
}

impl Default for MemoryAudio {
    fn default() -> Self {
        Self::new(0.0)
    }
}

fn clamp_volume(db: f32) -> f32 {
    if db.is_nan() {
        return 0.0;
    }
    db.clamp(MIN_VOLUME_DB, MAX_VOLUME_DB)
}

impl Audio for MemoryAudio {
    fn volume_db(&self) -> f32 {
        self.volume_db
    }

    fn set_volume_db(&mut self, db: f32) {
        self.volume_db = clamp_volume(db);
        trace!(volume_db = self.volume_db, "volume set");
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
