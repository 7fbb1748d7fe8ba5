//! The LED ring around the display.

use tracing::debug;

use crate::input::PETAL_COUNT;

/// Number of LEDs on the ring.
pub const LED_COUNT: usize = 40;

/// An LED color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A strip of addressable LEDs. Writes are buffered until `flush`.
pub trait LedStrip {
    /// Number of LEDs.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer a color. Out-of-range indices are ignored.
    fn set(&mut self, index: usize, color: Rgb);

    /// Buffered color of one LED.
    fn get(&self, index: usize) -> Option<Rgb>;

    /// Push buffered colors to the hardware.
    fn flush(&mut self);

    /// Buffer the same color on every LED.
    fn set_all(&mut self, color: Rgb) {
        for index in 0..self.len() {
            self.set(index, color);
        }
    }

    /// Light the `width` LEDs centered on petal `petal`.
    fn highlight_petal(&mut self, petal: usize, color: Rgb, width: usize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let width = width.min(len);
        let per_petal = len / PETAL_COUNT;
        let center = (petal % PETAL_COUNT) * per_petal;
        for i in 0..width {
            let index = (center + len + i - width / 2) % len;
            self.set(index, color);
        }
    }
}

/// Stand-in for a missing LED ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLeds;

impl LedStrip for NullLeds {
    fn len(&self) -> usize {
        0
    }

    fn set(&mut self, _index: usize, _color: Rgb) {}

    fn get(&self, _index: usize) -> Option<Rgb> {
        None
    }

    fn flush(&mut self) {}
}

/// An in-memory LED ring with a pending buffer and the last flushed state.
#[derive(Debug, Clone, PartialEq)]
pub struct LedBuffer {
    pending: Vec<Rgb>,
    shown: Vec<Rgb>,
    flushes: u64,
}

impl LedBuffer {
    /// A ring of `count` dark LEDs.
    pub fn new(count: usize) -> Self {
        Self {
            pending: vec![Rgb::OFF; count],
            shown: vec![Rgb::OFF; count],
            flushes: 0,
        }
    }

    /// Colors as of the last flush.
    pub fn shown(&self) -> &[Rgb] {
        &self.shown
    }

    /// Number of flushes so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl Default for LedBuffer {
    fn default() -> Self {
        Self::new(LED_COUNT)
    }
}

impl LedStrip for LedBuffer {
    fn len(&self) -> usize {
        self.pending.len()
    }

    fn set(&mut self, index: usize, color: Rgb) {
        match self.pending.get_mut(index) {
            Some(slot) => *slot = color,
            None => debug!(index, "led index out of range ignored"),
        }
    }

    fn get(&self, index: usize) -> Option<Rgb> {
        self.shown.get(index).copied()
    }

    fn flush(&mut self) {
        self.shown.clone_from(&self.pending);
        self.flushes += 1;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
