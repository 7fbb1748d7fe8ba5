//! Snapshot rendering helpers.
//!
//! Turn a responder's draw pass into text: either the command listing of
//! its [`DrawList`](crate::graphics::DrawList), for exact assertions, or a
//! rasterized character grid, for eyeballing layouts in snapshots.

use crate::graphics::{CharGrid, Graphics};
use crate::responder::Responder;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Draw `responder` once and list its commands, one per line, without a
/// trailing newline.
pub fn draw_to_string(responder: &dyn Responder) -> String {
    let mut g = Graphics::new();
    g.scoped(|g| responder.draw(g));
    g.finish().to_string().trim_end().to_owned()
}

/// Draw `responder` once and rasterize it onto a `cols` x `rows` grid.
///
/// Rows are right-trimmed and joined with `'\n'`; trailing blank rows are
/// dropped.
pub fn render_to_string(responder: &dyn Responder, cols: usize, rows: usize) -> String {
    let mut g = Graphics::new();
    g.scoped(|g| responder.draw(g));
    let grid = CharGrid::rasterize(&g.finish(), cols, rows);
    grid.to_string().trim_end().to_owned()
}

// ===========================================================================
// Tests
// ===========================================================================
