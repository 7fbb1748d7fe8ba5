//! Narrow interfaces to the device's actuators and storage, with inert
//! stand-ins for missing hardware.

pub mod audio;
pub mod leds;
pub mod settings;

pub use audio::{Audio, MemoryAudio, NullAudio, MAX_VOLUME_DB, MIN_VOLUME_DB};
pub use leds::{LedBuffer, LedStrip, NullLeds, Rgb, LED_COUNT};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsError, SettingsStore};
