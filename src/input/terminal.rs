//! Keyboard-driven input source for the terminal simulator.
//!
//! Maps keys onto the badge's inputs:
//!
//! | Keys              | Input                                  |
//! |-------------------|----------------------------------------|
//! | `a` `s` `d`       | app switch left / middle / right       |
//! | `←` `↓` `→`       | OS switch left / middle / right        |
//! | `z` `x` `c`       | OS switch left / middle / right        |
//! | `0`..`9`          | touch petal 0..9                       |
//! | `,` `.`           | drag the last touched petal            |
//! | `q` `Esc` `^C`    | quit                                   |
//!
//! Terminals only report key presses (and autorepeat), so a key counts as
//! held until a short timeout passes without a repeat. When the terminal
//! supports the kitty keyboard protocol, release events are used instead.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::snapshot::{RawInput, RawPetal, Switch, SwitchPosition, PETAL_COUNT};
use super::source::InputSource;

/// How long a key counts as held after its last press or repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(120);

/// Upper bound on a hold when release events are available.
const HOLD_SAFETY: Duration = Duration::from_secs(10);

/// Petal angle change per drag key press.
const DRAG_STEP: f32 = 0.1;

// ---------------------------------------------------------------------------
// Key mapping
// ---------------------------------------------------------------------------

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Switch(Switch, SwitchPosition),
    Petal(usize),
    Drag(f32),
    Quit,
}

/// Map a key to its action, `None` for unbound keys.
pub fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyAction> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            _ => None,
        };
    }
    let action = match code {
        KeyCode::Char('a') => KeyAction::Switch(Switch::App, SwitchPosition::Left),
        KeyCode::Char('s') => KeyAction::Switch(Switch::App, SwitchPosition::Middle),
        KeyCode::Char('d') => KeyAction::Switch(Switch::App, SwitchPosition::Right),
        KeyCode::Left | KeyCode::Char('z') => KeyAction::Switch(Switch::Os, SwitchPosition::Left),
        KeyCode::Down | KeyCode::Char('x') => {
            KeyAction::Switch(Switch::Os, SwitchPosition::Middle)
        }
        KeyCode::Right | KeyCode::Char('c') => {
            KeyAction::Switch(Switch::Os, SwitchPosition::Right)
        }
        KeyCode::Char(c @ '0'..='9') => KeyAction::Petal(c as usize - '0' as usize),
        KeyCode::Char(',') => KeyAction::Drag(-DRAG_STEP),
        KeyCode::Char('.') => KeyAction::Drag(DRAG_STEP),
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

// ---------------------------------------------------------------------------
// TerminalInput
// ---------------------------------------------------------------------------

/// Input source reading crossterm key events without blocking.
pub struct TerminalInput {
    state: RawInput,
    app_until: Option<Instant>,
    os_until: Option<Instant>,
    petal_until: [Option<Instant>; PETAL_COUNT],
    hold: Duration,
    release_events: bool,
    last_petal: usize,
    quit: Arc<Notify>,
}

impl TerminalInput {
    /// Create a source. `quit` is notified when a quit key is pressed.
    pub fn new(quit: Arc<Notify>) -> Self {
        Self {
            state: RawInput::default(),
            app_until: None,
            os_until: None,
            petal_until: [None; PETAL_COUNT],
            hold: HOLD_TIMEOUT,
            release_events: false,
            last_petal: 0,
            quit,
        }
    }

    /// Ask the terminal for key release events if it supports them.
    ///
    /// Must be called after raw mode has been enabled. Returns whether
    /// release events are now reported.
    pub fn enable_release_events(&mut self) -> io::Result<bool> {
        if !terminal::supports_keyboard_enhancement()? {
            debug!("terminal lacks keyboard enhancement, using hold timeout");
            return Ok(false);
        }
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
        self.release_events = true;
        self.hold = HOLD_SAFETY;
        Ok(true)
    }

    /// Apply one key event at time `now`.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(action) = map_key(key.code, key.modifiers) else {
            return;
        };
        let until = match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => Some(now + self.hold),
            KeyEventKind::Release => None,
        };
        match action {
            KeyAction::Switch(switch, position) => {
                let slot = match switch {
                    Switch::App => &mut self.app_until,
                    Switch::Os => &mut self.os_until,
                };
                match until {
                    Some(until) => {
                        *self.state.switch_mut(switch) = position;
                        *slot = Some(until);
                    }
                    None if self.state.switch(switch) == position => {
                        *self.state.switch_mut(switch) = SwitchPosition::Neutral;
                        *slot = None;
                    }
                    None => {}
                }
            }
            KeyAction::Petal(index) => {
                let petal = &mut self.state.petals[index];
                match until {
                    Some(until) => {
                        if !petal.pressed {
                            *petal = RawPetal {
                                pressed: true,
                                pressure: 2000,
                                rad: 0.5,
                                phi: petal.phi,
                            };
                        }
                        self.petal_until[index] = Some(until);
                        self.last_petal = index;
                    }
                    None => {
                        petal.pressed = false;
                        petal.pressure = 0;
                        self.petal_until[index] = None;
                    }
                }
            }
            KeyAction::Drag(step) => {
                if until.is_some() {
                    let petal = &mut self.state.petals[self.last_petal];
                    petal.phi = (petal.phi + step).clamp(-1.0, 1.0);
                    if petal.pressed {
                        self.petal_until[self.last_petal] = Some(now + self.hold);
                    }
                }
            }
            KeyAction::Quit => {
                if until.is_some() {
                    debug!("quit requested from keyboard");
                    self.quit.notify_one();
                }
            }
        }
    }

    /// Release everything whose hold has run out by `now`.
    pub fn expire(&mut self, now: Instant) {
        for switch in Switch::ALL {
            let slot = match switch {
                Switch::App => &mut self.app_until,
                Switch::Os => &mut self.os_until,
            };
            if slot.is_some_and(|until| until <= now) {
                *slot = None;
                *self.state.switch_mut(switch) = SwitchPosition::Neutral;
            }
        }
        for (index, slot) in self.petal_until.iter_mut().enumerate() {
            if slot.is_some_and(|until| until <= now) {
                *slot = None;
                self.state.petals[index].pressed = false;
                self.state.petals[index].pressure = 0;
            }
        }
    }

    /// Current state without polling the terminal.
    pub fn state(&self) -> RawInput {
        self.state
    }

    fn drain_events(&mut self) {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    warn!(error = %err, "terminal poll failed");
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) => self.handle_key(key, Instant::now()),
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "terminal read failed");
                    break;
                }
            }
        }
    }
}

impl InputSource for TerminalInput {
    fn sample(&mut self) -> RawInput {
        self.drain_events();
        self.expire(Instant::now());
        self.state
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        if self.release_events {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn input() -> TerminalInput {
        TerminalInput::new(Arc::new(Notify::new()))
    }

    // ── Mapping ──────────────────────────────────────────────────────

    #[test]
    fn maps_switch_keys() {
        assert_eq!(
            map_key(KeyCode::Char('a'), KeyModifiers::NONE),
            Some(KeyAction::Switch(Switch::App, SwitchPosition::Left))
        );
        assert_eq!(
            map_key(KeyCode::Down, KeyModifiers::NONE),
            Some(KeyAction::Switch(Switch::Os, SwitchPosition::Middle))
        );
    }

    #[test]
    fn maps_digits_to_petals() {
        assert_eq!(
            map_key(KeyCode::Char('7'), KeyModifiers::NONE),
            Some(KeyAction::Petal(7))
        );
    }

    #[test]
    fn ctrl_c_quits_but_c_does_not() {
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::NONE),
            Some(KeyAction::Switch(Switch::Os, SwitchPosition::Right))
        );
    }

    #[test]
    fn unbound_keys_map_to_none() {
        assert_eq!(map_key(KeyCode::F(5), KeyModifiers::NONE), None);
    }

    // ── Hold tracking ────────────────────────────────────────────────

    #[test]
    fn press_holds_until_timeout() {
        let mut input = input();
        let t0 = Instant::now();
        input.handle_key(key(KeyCode::Char('s'), KeyEventKind::Press), t0);
        input.expire(t0 + Duration::from_millis(50));
        assert_eq!(input.state().app, SwitchPosition::Middle);
        input.expire(t0 + HOLD_TIMEOUT);
        assert_eq!(input.state().app, SwitchPosition::Neutral);
    }

    #[test]
    fn repeat_extends_hold() {
        let mut input = input();
        let t0 = Instant::now();
        input.handle_key(key(KeyCode::Char('3'), KeyEventKind::Press), t0);
        let t1 = t0 + Duration::from_millis(100);
        input.handle_key(key(KeyCode::Char('3'), KeyEventKind::Repeat), t1);
        input.expire(t0 + HOLD_TIMEOUT);
        assert!(input.state().petals[3].pressed);
        input.expire(t1 + HOLD_TIMEOUT);
        assert!(!input.state().petals[3].pressed);
    }

    #[test]
    fn release_event_releases_immediately() {
        let mut input = input();
        let t0 = Instant::now();
        input.handle_key(key(KeyCode::Left, KeyEventKind::Press), t0);
        input.handle_key(key(KeyCode::Left, KeyEventKind::Release), t0);
        assert_eq!(input.state().os, SwitchPosition::Neutral);
    }

    #[test]
    fn drag_moves_last_petal() {
        let mut input = input();
        let t0 = Instant::now();
        input.handle_key(key(KeyCode::Char('2'), KeyEventKind::Press), t0);
        input.handle_key(key(KeyCode::Char('.'), KeyEventKind::Press), t0);
        assert!((input.state().petals[2].phi - DRAG_STEP).abs() < 1e-6);
    }

    #[tokio::test]
    async fn quit_key_notifies() {
        let quit = Arc::new(Notify::new());
        let mut input = TerminalInput::new(quit.clone());
        input.handle_key(key(KeyCode::Char('q'), KeyEventKind::Press), Instant::now());
        // The stored permit completes the wait immediately.
        quit.notified().await;
    }
}
