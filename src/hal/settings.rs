//! Persisted user settings.
//!
//! Loading never fails: a missing, unreadable or corrupt store yields
//! [`Settings::default`] (logged at `warn`). Only saving reports errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::input::RepeatSettings;

/// Errors from writing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// User-tunable values. Unknown keys are ignored and missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Startup volume in dB.
    pub volume_db: f32,
    /// Exchange the app and OS shoulder switches.
    pub swap_buttons: bool,
    /// Show frame timing in a corner of the display.
    pub show_debug_overlay: bool,
    /// Duration of navigation transitions.
    pub transition_ms: u32,
    /// Held-button repeat thresholds for menus and volume.
    pub repeat: RepeatSettings,
    /// LED ring brightness, `0 ..= 255`.
    pub led_brightness: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume_db: 0.0,
            swap_buttons: false,
            show_debug_overlay: false,
            transition_ms: 150,
            repeat: RepeatSettings::default(),
            led_brightness: 70,
        }
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Where settings live.
pub trait SettingsStore {
    /// Load every setting, falling back to defaults on any problem.
    fn load_all(&mut self) -> Settings;

    /// Persist every setting.
    fn save_all(&mut self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Decode settings text, degrading to defaults.
fn decode(text: &str, origin: &str) -> Settings {
    match serde_json::from_str(text) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(origin, error = %err, "corrupt settings, using defaults");
            Settings::default()
        }
    }
}

/// Settings stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load_all(&mut self) -> Settings {
        let origin = self.path.display().to_string();
        match fs::read_to_string(&self.path) {
            Ok(text) => decode(&text, &origin),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %origin, "no settings file, using defaults");
                Settings::default()
            }
            Err(err) => {
                warn!(path = %origin, error = %err, "settings unreadable, using defaults");
                Settings::default()
            }
        }
    }

    fn save_all(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(settings)?;
        // Write beside the target and rename so a crash never leaves a
        // half-written file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// Settings kept in memory as JSON text.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contents: Option<String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with raw text, which need not be valid JSON.
    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            contents: Some(text.into()),
        }
    }

    /// The stored text.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl SettingsStore for MemoryStore {
    fn load_all(&mut self) -> Settings {
        match &self.contents {
            Some(text) => decode(text, "memory"),
            None => Settings::default(),
        }
    }

    fn save_all(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        self.contents = Some(serde_json::to_string(settings)?);
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
