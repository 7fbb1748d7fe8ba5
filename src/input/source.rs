//! Input sources: where raw samples come from.
//!
//! The reactor pulls one [`RawInput`] per tick from a boxed [`InputSource`].
//! On hardware this reads the switches, petals and IMU; in the simulator it
//! is [`TerminalInput`](super::TerminalInput); in tests it is a
//! [`ManualInput`] whose state the test flips directly.

use std::cell::RefCell;
use std::rc::Rc;

use super::snapshot::{ImuReading, RawInput, RawPetal, Switch, SwitchPosition, PETAL_COUNT};

/// Produces a level-only sample of all inputs.
pub trait InputSource {
    /// Read the current state of every input.
    fn sample(&mut self) -> RawInput;
}

// ---------------------------------------------------------------------------
// NullInput
// ---------------------------------------------------------------------------

/// A source where nothing is ever pressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn sample(&mut self) -> RawInput {
        RawInput::default()
    }
}

// ---------------------------------------------------------------------------
// ManualInput
// ---------------------------------------------------------------------------

/// A shared, hand-driven input state.
///
/// Cloning yields another handle to the same state: hand one clone to the
/// reactor and keep the other to press buttons between ticks.
#[derive(Debug, Clone, Default)]
pub struct ManualInput {
    state: Rc<RefCell<RawInput>>,
}

impl ManualInput {
    /// Create a source with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a switch to `position` and leave it there.
    pub fn hold(&self, switch: Switch, position: SwitchPosition) {
        *self.state.borrow_mut().switch_mut(switch) = position;
    }

    /// Return a switch to neutral.
    pub fn release(&self, switch: Switch) {
        self.hold(switch, SwitchPosition::Neutral);
    }

    /// Touch petal `index` at the given position. Out-of-range indices are
    /// ignored.
    pub fn touch(&self, index: usize, rad: f32, phi: f32) {
        if let Some(petal) = self.state.borrow_mut().petals.get_mut(index) {
            *petal = RawPetal {
                pressed: true,
                pressure: 2000,
                rad,
                phi,
            };
        }
    }

    /// Lift the finger from petal `index`, keeping its last position.
    pub fn lift(&self, index: usize) {
        if let Some(petal) = self.state.borrow_mut().petals.get_mut(index) {
            petal.pressed = false;
            petal.pressure = 0;
        }
    }

    /// Lift every petal and center every switch.
    pub fn reset(&self) {
        let imu = self.state.borrow().imu;
        *self.state.borrow_mut() = RawInput {
            imu,
            ..RawInput::default()
        };
    }

    /// Replace the IMU reading.
    pub fn set_imu(&self, imu: ImuReading) {
        self.state.borrow_mut().imu = imu;
    }

    /// Replace the whole state.
    pub fn set(&self, raw: RawInput) {
        *self.state.borrow_mut() = raw;
    }

    /// Current state.
    pub fn get(&self) -> RawInput {
        *self.state.borrow()
    }

    /// Number of petals addressable through [`touch`](Self::touch).
    pub fn petal_count(&self) -> usize {
        PETAL_COUNT
    }
}

impl InputSource for ManualInput {
    fn sample(&mut self) -> RawInput {
        self.get()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
