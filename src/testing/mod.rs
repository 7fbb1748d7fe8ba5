//! Headless testing framework: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a reactor tick by tick without a terminal.
//! Use [`draw_to_string`] and [`render_to_string`] to capture a responder's
//! output as plain text for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{draw_to_string, render_to_string};
