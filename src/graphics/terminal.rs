//! Crossterm character-cell rasterizer used by the simulator.
//!
//! The round display is approximated by a fixed grid of terminal cells.
//! [`CharGrid::rasterize`] turns a [`DrawList`] into cells (pure and
//! testable); [`TerminalDisplay`] writes the grid to stdout.

use std::fmt;
use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;

use super::drawlist::{Color, DrawCommand, DrawList};
use super::pipeline::Display;
use crate::geometry::{Point, HALF_EXTENT};

/// Grid width in terminal cells.
pub const COLUMNS: usize = 60;
/// Grid height in terminal cells.
pub const ROWS: usize = 30;

/// Characters for increasing fill coverage.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

// ---------------------------------------------------------------------------
// CharGrid
// ---------------------------------------------------------------------------

/// One terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            color: Color::BLACK,
        }
    }
}

/// A rasterized frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CharGrid {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl CharGrid {
    /// A blank grid.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    /// Rasterize `list` onto a blank grid of the given size.
    pub fn rasterize(list: &DrawList, cols: usize, rows: usize) -> Self {
        let mut grid = Self::new(cols, rows);
        for command in list.commands() {
            grid.paint(command);
        }
        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cell at `(col, row)`.
    pub fn get(&self, col: usize, row: usize) -> Option<&Cell> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// Characters of one row, trailing blanks trimmed.
    pub fn row_text(&self, row: usize) -> String {
        let text: String = (0..self.cols)
            .filter_map(|col| self.get(col, row).map(|c| c.ch))
            .collect();
        text.trim_end().to_owned()
    }

    fn cell_width(&self) -> f32 {
        2.0 * HALF_EXTENT / self.cols as f32
    }

    fn cell_height(&self) -> f32 {
        2.0 * HALF_EXTENT / self.rows as f32
    }

    /// Center of a cell in display coordinates.
    fn center(&self, col: usize, row: usize) -> Point {
        Point::new(
            -HALF_EXTENT + (col as f32 + 0.5) * self.cell_width(),
            -HALF_EXTENT + (row as f32 + 0.5) * self.cell_height(),
        )
    }

    /// Cell containing a display point.
    fn locate(&self, p: Point) -> Option<(usize, usize)> {
        let col = ((p.x + HALF_EXTENT) / self.cell_width()).floor();
        let row = ((p.y + HALF_EXTENT) / self.cell_height()).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    fn put(&mut self, col: usize, row: usize, ch: char, color: Color) {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] = Cell { ch, color };
        }
    }

    fn fill_where(&mut self, ch: char, color: Color, inside: impl Fn(Point) -> bool) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if inside(self.center(col, row)) {
                    self.put(col, row, ch, color);
                }
            }
        }
    }

    fn paint(&mut self, command: &DrawCommand) {
        let shade = shade(command.color(), command.alpha());
        let color = command.color();
        match command {
            DrawCommand::Rect { rect, .. } => {
                let rect = *rect;
                self.fill_where(shade, color, |p| rect.contains(p));
            }
            DrawCommand::Circle { center, radius, .. } => {
                let (center, radius) = (*center, *radius);
                self.fill_where(shade, color, |p| (p - center).length() <= radius);
            }
            DrawCommand::Line { from, to, .. } => {
                let span = *to - *from;
                let steps = (span.x.abs() / self.cell_width())
                    .max(span.y.abs() / self.cell_height())
                    .ceil() as usize
                    * 2
                    + 1;
                for i in 0..=steps {
                    let p = from.lerp(*to, i as f32 / steps as f32);
                    if let Some((col, row)) = self.locate(p) {
                        self.put(col, row, '•', color);
                    }
                }
            }
            DrawCommand::Text { origin, size, text, .. } => {
                // Baseline-anchored: the glyph body sits above the origin.
                let anchor = Point::new(origin.x, origin.y - size * 0.5);
                let Some((col, row)) = self.locate(anchor) else {
                    return;
                };
                for (i, ch) in text.chars().enumerate() {
                    self.put(col + i, row, ch, color);
                }
            }
        }
    }
}

/// Shade character for a fill of `color` at `alpha`.
fn shade(color: Color, alpha: f32) -> char {
    let level = (color.luma() * alpha.clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round();
    SHADES[(level as usize).min(SHADES.len() - 1)]
}

impl fmt::Display for CharGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            writeln!(f, "{}", self.row_text(row))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TerminalDisplay
// ---------------------------------------------------------------------------

/// Display backend writing rasterized frames to the terminal.
///
/// Does NOT enter the alternate screen on creation; call
/// [`enter`](Self::enter) explicitly and [`leave`](Self::leave) on exit.
pub struct TerminalDisplay {
    writer: BufWriter<Stdout>,
    last: Option<CharGrid>,
}

impl TerminalDisplay {
    /// Create a display wrapping stdout.
    pub fn new() -> Self {
        Self {
            writer: BufWriter::new(io::stdout()),
            last: None,
        }
    }

    /// Enter the alternate screen, enable raw mode and hide the cursor.
    pub fn enter(&mut self) -> io::Result<()> {
        execute!(self.writer, EnterAlternateScreen, cursor::Hide)?;
        terminal::enable_raw_mode()?;
        Ok(())
    }

    /// Undo [`enter`](Self::enter).
    pub fn leave(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.writer, cursor::Show, LeaveAlternateScreen)?;
        Ok(())
    }

    fn write_grid(&mut self, grid: &CharGrid) -> io::Result<()> {
        for row in 0..grid.rows() {
            if self.last.as_ref().and_then(|last| last.row_cells(row)) == grid.row_cells(row) {
                continue;
            }
            queue!(self.writer, cursor::MoveTo(0, row as u16))?;
            for col in 0..grid.cols() {
                if let Some(cell) = grid.get(col, row) {
                    let (r, g, b) = cell.color.to_rgb8();
                    queue!(
                        self.writer,
                        SetForegroundColor(TermColor::Rgb { r, g, b }),
                        Print(cell.ch)
                    )?;
                }
            }
            queue!(self.writer, ResetColor)?;
        }
        self.writer.flush()
    }
}

impl CharGrid {
    fn row_cells(&self, row: usize) -> Option<&[Cell]> {
        let start = row.checked_mul(self.cols)?;
        self.cells.get(start..start + self.cols)
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TerminalDisplay {
    fn flip(&mut self, list: &DrawList) {
        let grid = CharGrid::rasterize(list, COLUMNS, ROWS);
        if let Err(err) = self.write_grid(&grid) {
            warn!(error = %err, "terminal write failed");
        }
        self.last = Some(grid);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
