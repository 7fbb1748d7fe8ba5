//! Responder and View traits: think, draw, enter, exit.
//!
//! A [`Responder`] is anything the reactor can drive once per tick: it
//! updates its state in [`think`](Responder::think) and renders itself in
//! [`draw`](Responder::draw). A [`View`] is a responder that can live on the
//! navigation stack and be told when it gains or loses the foreground.

use std::any::Any;

use crate::context::Context;
use crate::graphics::Graphics;
use crate::input::InputSnapshot;

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Downcasting support for trait objects.
///
/// Implemented for every `'static` sized type, so responders get it for free.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

/// Something that reacts to input and draws itself.
///
/// Both methods run on the reactor's single thread, once per tick, in the
/// order think then draw. Implementations should return quickly: a slow
/// responder delays the whole tick.
pub trait Responder: AsAny {
    /// Advance state by `delta_ms` using this tick's input.
    ///
    /// `delta_ms` may be zero.
    fn think(&mut self, cx: &mut Context, input: &InputSnapshot, delta_ms: u32);

    /// Render into `g`. Coordinates are centered on the display, with
    /// `±120` at the edges.
    fn draw(&self, g: &mut Graphics);
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A responder that can be pushed onto the navigation stack.
pub trait View: Responder {
    /// Called once when the view becomes the foreground, after its entry
    /// transition completes.
    fn on_enter(&mut self, _cx: &mut Context) {}

    /// Called once when the view stops being the foreground, after its exit
    /// transition completes.
    fn on_exit(&mut self, _cx: &mut Context) {}

    /// Whether status icons should be drawn over this view.
    fn show_icons(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// FnView
// ---------------------------------------------------------------------------

/// A view built from a draw closure. Handy for static screens and tests.
pub struct FnView<D> {
    draw: D,
}

impl<D> FnView<D>
where
    D: Fn(&mut Graphics) + 'static,
{
    pub fn new(draw: D) -> Self {
        Self { draw }
    }
}

impl<D> Responder for FnView<D>
where
    D: Fn(&mut Graphics) + 'static,
{
    fn think(&mut self, _cx: &mut Context, _input: &InputSnapshot, _delta_ms: u32) {}

    fn draw(&self, g: &mut Graphics) {
        (self.draw)(g);
    }
}

impl<D> View for FnView<D> where D: Fn(&mut Graphics) + 'static {}

// ===========================================================================
// Tests
// ===========================================================================
