//! Per-tick input snapshot and the gatherer that builds it.
//!
//! Hardware is sampled into a [`RawInput`] (levels only). The
//! [`InputGatherer`] keeps the previous sample and turns the new one into an
//! immutable [`InputSnapshot`] with edges, hold times and gesture deltas.
//! The snapshot is handed to every `think` of the tick and then dropped.

use tracing::trace;

/// Number of capacitive touch petals around the display.
pub const PETAL_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Raw hardware levels
// ---------------------------------------------------------------------------

/// Position of a tri-state shoulder switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwitchPosition {
    #[default]
    Neutral,
    Left,
    Middle,
    Right,
}

/// Which shoulder switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    /// The switch reserved for the foreground application.
    App,
    /// The switch reserved for system functions (volume, back).
    Os,
}

impl Switch {
    pub const ALL: [Switch; 2] = [Switch::App, Switch::Os];

    /// Lowercase name used in event payloads.
    pub fn name(self) -> &'static str {
        match self {
            Switch::App => "app",
            Switch::Os => "os",
        }
    }
}

/// One of the three buttons a tri-state switch decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Middle,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Left, Direction::Middle, Direction::Right];

    /// Lowercase name used in event payloads.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Middle => "middle",
            Direction::Right => "right",
        }
    }

    fn position(self) -> SwitchPosition {
        match self {
            Direction::Left => SwitchPosition::Left,
            Direction::Middle => SwitchPosition::Middle,
            Direction::Right => SwitchPosition::Right,
        }
    }
}

/// Raw reading of one touch petal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPetal {
    pub pressed: bool,
    pub pressure: u16,
    /// Radial position, `0.0` at the inner end, `1.0` at the outer end.
    pub rad: f32,
    /// Angular position across the petal, `-1.0 ..= 1.0`.
    pub phi: f32,
}

/// Inertial sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuReading {
    /// Acceleration in m/s² (x, y, z).
    pub acc: [f32; 3],
    /// Angular velocity in °/s (x, y, z).
    pub gyro: [f32; 3],
    /// Barometric pressure in Pa.
    pub pressure: f32,
    /// Sensor temperature in °C.
    pub temperature: f32,
}

/// Level-only sample of every input source, produced by an
/// [`InputSource`](super::InputSource).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawInput {
    pub app: SwitchPosition,
    pub os: SwitchPosition,
    pub petals: [RawPetal; PETAL_COUNT],
    pub imu: ImuReading,
}

impl RawInput {
    /// Position of the given switch.
    pub fn switch(&self, switch: Switch) -> SwitchPosition {
        match switch {
            Switch::App => self.app,
            Switch::Os => self.os,
        }
    }

    /// Mutable position of the given switch.
    pub fn switch_mut(&mut self, switch: Switch) -> &mut SwitchPosition {
        match switch {
            Switch::App => &mut self.app,
            Switch::Os => &mut self.os,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Edge and level state of a single button for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// The button is held this tick.
    pub down: bool,
    /// The button went down this tick.
    pub pressed: bool,
    /// The button went up this tick.
    pub released: bool,
    /// How long the button has been held, `0` on the tick it was pressed.
    pub held_ms: u32,
}

impl ButtonState {
    fn without_edges(self) -> Self {
        Self {
            pressed: false,
            released: false,
            ..self
        }
    }
}

/// The three decoded buttons of a shoulder switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriSwitch {
    pub left: ButtonState,
    pub middle: ButtonState,
    pub right: ButtonState,
}

impl TriSwitch {
    /// State of one button.
    pub fn get(&self, direction: Direction) -> &ButtonState {
        match direction {
            Direction::Left => &self.left,
            Direction::Middle => &self.middle,
            Direction::Right => &self.right,
        }
    }

    fn get_mut(&mut self, direction: Direction) -> &mut ButtonState {
        match direction {
            Direction::Left => &mut self.left,
            Direction::Middle => &mut self.middle,
            Direction::Right => &mut self.right,
        }
    }
}

/// Both shoulder switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Buttons {
    pub app: TriSwitch,
    pub os: TriSwitch,
}

impl Buttons {
    /// State of one switch.
    pub fn get(&self, switch: Switch) -> &TriSwitch {
        match switch {
            Switch::App => &self.app,
            Switch::Os => &self.os,
        }
    }

    /// Shorthand for `get(switch).get(direction)`.
    pub fn button(&self, switch: Switch, direction: Direction) -> &ButtonState {
        self.get(switch).get(direction)
    }

    fn get_mut(&mut self, switch: Switch) -> &mut TriSwitch {
        match switch {
            Switch::App => &mut self.app,
            Switch::Os => &mut self.os,
        }
    }
}

/// Polar position on a petal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polar {
    pub rad: f32,
    pub phi: f32,
}

/// Phase of a touch gesture on one petal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GesturePhase {
    /// Not touched.
    #[default]
    Up,
    /// Touch started this tick.
    Begin,
    /// Touch continues.
    Moved,
    /// Touch ended this tick.
    Ended,
}

/// Touch state of one petal for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PetalState {
    pub index: u8,
    /// The petal is touched this tick.
    pub down: bool,
    /// Touch started this tick.
    pub pressed: bool,
    /// Touch ended this tick.
    pub released: bool,
    pub pressure: u16,
    /// Current touch position (last known position once released).
    pub position: Polar,
    /// Movement since the previous tick, zero unless the touch continued.
    pub delta: Polar,
    pub phase: GesturePhase,
}

/// Immutable, debounced view of all inputs for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot {
    /// Milliseconds of reactor time at which this snapshot was gathered.
    pub timestamp_ms: u64,
    pub buttons: Buttons,
    pub petals: [PetalState; PETAL_COUNT],
    pub imu: ImuReading,
}

impl InputSnapshot {
    /// A snapshot with nothing touched or held.
    pub fn idle() -> Self {
        Self {
            timestamp_ms: 0,
            buttons: Buttons::default(),
            petals: std::array::from_fn(|i| PetalState {
                index: i as u8,
                ..PetalState::default()
            }),
            imu: ImuReading::default(),
        }
    }

    /// State of one petal, `None` for an out-of-range index.
    pub fn petal(&self, index: usize) -> Option<&PetalState> {
        self.petals.get(index)
    }

    /// An idle snapshot with one button on its press tick.
    pub fn pressing(switch: Switch, direction: Direction) -> Self {
        let mut input = Self::idle();
        let button = input.buttons.get_mut(switch).get_mut(direction);
        button.down = true;
        button.pressed = true;
        input
    }

    /// Copy of this snapshot with every edge and gesture delta cleared.
    ///
    /// Levels (held buttons, touched petals) are preserved. Handed to views
    /// that are visible but must not react to presses, such as a view that
    /// is being navigated away from.
    pub fn without_edges(&self) -> Self {
        let mut quiet = self.clone();
        for switch in [&mut quiet.buttons.app, &mut quiet.buttons.os] {
            for direction in Direction::ALL {
                let button = switch.get_mut(direction);
                *button = button.without_edges();
            }
        }
        for petal in &mut quiet.petals {
            petal.pressed = false;
            petal.released = false;
            petal.delta = Polar::default();
            if petal.phase != GesturePhase::Up {
                petal.phase = if petal.down {
                    GesturePhase::Moved
                } else {
                    GesturePhase::Up
                };
            }
        }
        quiet
    }
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

// ---------------------------------------------------------------------------
// InputGatherer
// ---------------------------------------------------------------------------

/// Turns successive raw samples into snapshots.
///
/// Owned by the reactor; one `gather` per tick.
#[derive(Debug, Clone, Default)]
pub struct InputGatherer {
    previous: RawInput,
    held_ms: [[u32; 3]; 2],
    elapsed_ms: u64,
    swap_buttons: bool,
}

impl InputGatherer {
    /// Create a gatherer with nothing held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the roles of the app and OS switches (left-handed use).
    pub fn set_buttons_swapped(&mut self, swapped: bool) {
        self.swap_buttons = swapped;
    }

    /// Whether the switches are swapped.
    pub fn buttons_swapped(&self) -> bool {
        self.swap_buttons
    }

    /// Build the snapshot for a tick that lasted `delta_ms`.
    pub fn gather(&mut self, raw: RawInput, delta_ms: u32) -> InputSnapshot {
        let mut raw = sanitize(raw);
        if self.swap_buttons {
            std::mem::swap(&mut raw.app, &mut raw.os);
        }
        self.elapsed_ms += u64::from(delta_ms);

        let mut buttons = Buttons::default();
        for (s, switch) in Switch::ALL.into_iter().enumerate() {
            let now = raw.switch(switch);
            let before = self.previous.switch(switch);
            for (d, direction) in Direction::ALL.into_iter().enumerate() {
                let down = now == direction.position();
                let was_down = before == direction.position();
                let held = &mut self.held_ms[s][d];
                *held = match (down, was_down) {
                    (true, true) => held.saturating_add(delta_ms),
                    _ => 0,
                };
                *buttons.get_mut(switch).get_mut(direction) = ButtonState {
                    down,
                    pressed: down && !was_down,
                    released: !down && was_down,
                    held_ms: *held,
                };
            }
        }

        let petals = std::array::from_fn(|i| {
            let now = raw.petals[i];
            let before = self.previous.petals[i];
            petal_state(i, now, before)
        });

        self.previous = raw;
        let snapshot = InputSnapshot {
            timestamp_ms: self.elapsed_ms,
            buttons,
            petals,
            imu: raw.imu,
        };
        trace!(timestamp_ms = snapshot.timestamp_ms, "input gathered");
        snapshot
    }
}

fn petal_state(index: usize, now: RawPetal, before: RawPetal) -> PetalState {
    let (phase, delta) = match (now.pressed, before.pressed) {
        (true, false) => (GesturePhase::Begin, Polar::default()),
        (true, true) => (
            GesturePhase::Moved,
            Polar {
                rad: now.rad - before.rad,
                phi: now.phi - before.phi,
            },
        ),
        (false, true) => (GesturePhase::Ended, Polar::default()),
        (false, false) => (GesturePhase::Up, Polar::default()),
    };
    let position = if now.pressed || !before.pressed {
        Polar {
            rad: now.rad,
            phi: now.phi,
        }
    } else {
        Polar {
            rad: before.rad,
            phi: before.phi,
        }
    };
    PetalState {
        index: index as u8,
        down: now.pressed,
        pressed: now.pressed && !before.pressed,
        released: !now.pressed && before.pressed,
        pressure: now.pressure,
        position,
        delta,
        phase,
    }
}

/// Replace non-finite sensor values with neutral ones.
fn sanitize(mut raw: RawInput) -> RawInput {
    fn finite(v: f32) -> f32 {
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }
    for petal in &mut raw.petals {
        petal.rad = finite(petal.rad);
        petal.phi = finite(petal.phi);
    }
    for v in raw.imu.acc.iter_mut().chain(raw.imu.gyro.iter_mut()) {
        *v = finite(*v);
    }
    raw.imu.pressure = finite(raw.imu.pressure);
    raw.imu.temperature = finite(raw.imu.temperature);
    raw
}

// ===========================================================================
// Tests
// ===========================================================================
