//! Reactor configuration.

use serde::Deserialize;

use crate::hal::Settings;
use crate::input::{Direction, RepeatSettings, Switch};
use crate::nav::{ViewManager, DEFAULT_TRANSITION_MS};
use crate::responder::View;
use crate::scroll::GestureScrollController;

/// Configuration for the reactor and the views it builds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Nominal tick interval in milliseconds.
    pub tick_ms: u32,
    /// Duration of navigation transitions.
    pub transition_ms: u32,
    /// Held-button repeat thresholds.
    pub repeat: RepeatSettings,
    /// Exchange the app and OS shoulder switches.
    pub swap_buttons: bool,
    /// Items scrolled per radian of drag on a gesture scroller.
    pub gesture_sensitivity: f32,
    /// Pop the navigation stack on an OS middle press.
    pub back_button: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            transition_ms: DEFAULT_TRANSITION_MS,
            repeat: RepeatSettings::default(),
            swap_buttons: false,
            gesture_sensitivity: 4.0,
            back_button: true,
        }
    }
}

impl ReactorConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval (builder). Zero is raised to one millisecond.
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms.max(1);
        self
    }

    /// Set the transition duration (builder).
    pub fn with_transition_ms(mut self, ms: u32) -> Self {
        self.transition_ms = ms;
        self
    }

    /// Set the repeat thresholds (builder).
    pub fn with_repeat(mut self, repeat: RepeatSettings) -> Self {
        self.repeat = repeat;
        self
    }

    /// Swap the shoulder switches (builder).
    pub fn with_swap_buttons(mut self, swapped: bool) -> Self {
        self.swap_buttons = swapped;
        self
    }

    /// Set the gesture sensitivity (builder).
    pub fn with_gesture_sensitivity(mut self, sensitivity: f32) -> Self {
        self.gesture_sensitivity = sensitivity;
        self
    }

    /// Enable or disable the back button (builder).
    pub fn with_back_button(mut self, enabled: bool) -> Self {
        self.back_button = enabled;
        self
    }

    /// Apply the user-tunable values from persisted settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.transition_ms = settings.transition_ms;
        self.repeat = settings.repeat;
        self.swap_buttons = settings.swap_buttons;
        self
    }

    /// A view manager rooted at `root` using this config's transition
    /// duration and back button.
    pub fn view_manager(&self, root: Box<dyn View>) -> ViewManager {
        let back = self
            .back_button
            .then_some((Switch::Os, Direction::Middle));
        ViewManager::new(root)
            .with_transition_ms(self.transition_ms)
            .with_back_button(back)
    }

    /// A gesture scroller over `item_count` items on petal `zone` using this
    /// config's sensitivity.
    pub fn gesture_scroller(&self, item_count: usize, zone: usize) -> GestureScrollController {
        GestureScrollController::new(item_count, zone).with_sensitivity(self.gesture_sensitivity)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Graphics;
    use crate::responder::FnView;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = ReactorConfig::new();
        assert_eq!(config.tick_ms, 20);
        assert_eq!(config.transition_ms, 150);
        assert_eq!(config.repeat, RepeatSettings::new(400, 200));
        assert!(config.back_button);
    }

    #[test]
    fn builder() {
        let config = ReactorConfig::new()
            .with_tick_ms(0)
            .with_transition_ms(0)
            .with_swap_buttons(true)
            .with_gesture_sensitivity(2.0)
            .with_back_button(false);
        assert_eq!(config.tick_ms, 1);
        assert_eq!(config.transition_ms, 0);
        assert!(config.swap_buttons);
        assert_eq!(config.gesture_sensitivity, 2.0);
        assert!(!config.back_button);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ReactorConfig =
            serde_json::from_str(r#"{"tick_ms": 10, "repeat": {"rate_ms": 50}}"#).unwrap();
        assert_eq!(
            config,
            ReactorConfig {
                tick_ms: 10,
                repeat: RepeatSettings::new(400, 50),
                ..ReactorConfig::default()
            }
        );
    }

    #[test]
    fn settings_map_onto_config() {
        let settings = Settings {
            swap_buttons: true,
            transition_ms: 300,
            repeat: RepeatSettings::new(250, 100),
            ..Settings::default()
        };
        let config = ReactorConfig::new().with_settings(&settings);
        assert!(config.swap_buttons);
        assert_eq!(config.transition_ms, 300);
        assert_eq!(config.repeat, RepeatSettings::new(250, 100));
    }

    #[test]
    fn builds_configured_view_manager() {
        let config = ReactorConfig::new().with_transition_ms(40);
        let vm = config.view_manager(Box::new(FnView::new(|_: &mut Graphics| {})));
        assert_eq!(vm.transition_ms(), 40);
    }
}
