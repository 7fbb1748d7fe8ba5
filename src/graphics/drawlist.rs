//! Immediate-mode drawing into a retained command list.
//!
//! Responders draw through a [`Graphics`] context lent to them by the
//! reactor. Every call is resolved against the current [`DrawState`]
//! (transform, group alpha, color, font size) and recorded as an absolute
//! [`DrawCommand`], so the finished [`DrawList`] can be rasterized without
//! replaying any state.

use std::fmt;

use tracing::debug;

use crate::geometry::{Point, Rect};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGB color with channels in `0.0 ..= 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// Create a color from channels, each clamped on output.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// A gray level.
    pub const fn gray(v: f32) -> Self {
        Self::rgb(v, v, v)
    }

    /// Channels as bytes.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        fn byte(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        (byte(self.r), byte(self.g), byte(self.b))
    }

    /// Perceived brightness, `0.0 ..= 1.0`.
    pub fn luma(self) -> f32 {
        (0.299 * self.r + 0.587 * self.g + 0.114 * self.b).clamp(0.0, 1.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, g, b) = self.to_rgb8();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

// ---------------------------------------------------------------------------
// DrawState
// ---------------------------------------------------------------------------

/// Translation followed by uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub tx: f32,
    pub ty: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Map a local point to display coordinates.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.tx + p.x * self.scale, self.ty + p.y * self.scale)
    }

    /// Map a local length to display units.
    #[inline]
    pub fn apply_len(&self, len: f32) -> f32 {
        len * self.scale
    }
}

/// Everything `save`/`restore` preserves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub transform: Transform,
    /// Group opacity applied to everything drawn.
    pub alpha: f32,
    pub color: Color,
    pub font_size: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            alpha: 1.0,
            color: Color::WHITE,
            font_size: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// DrawCommand / DrawList
// ---------------------------------------------------------------------------

/// One resolved drawing operation in display coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        color: Color,
        alpha: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
        alpha: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        alpha: f32,
    },
    Text {
        origin: Point,
        size: f32,
        text: String,
        color: Color,
        alpha: f32,
    },
}

impl DrawCommand {
    /// Opacity of this command.
    pub fn alpha(&self) -> f32 {
        match self {
            DrawCommand::Rect { alpha, .. }
            | DrawCommand::Circle { alpha, .. }
            | DrawCommand::Line { alpha, .. }
            | DrawCommand::Text { alpha, .. } => *alpha,
        }
    }

    /// Color of this command.
    pub fn color(&self) -> Color {
        match self {
            DrawCommand::Rect { color, .. }
            | DrawCommand::Circle { color, .. }
            | DrawCommand::Line { color, .. }
            | DrawCommand::Text { color, .. } => *color,
        }
    }
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::Rect { rect, color, alpha } => write!(
                f,
                "rect {:.1},{:.1} {:.1}x{:.1} {color} a{alpha:.2}",
                rect.x, rect.y, rect.width, rect.height
            ),
            DrawCommand::Circle {
                center,
                radius,
                color,
                alpha,
            } => write!(
                f,
                "circle {:.1},{:.1} r{radius:.1} {color} a{alpha:.2}",
                center.x, center.y
            ),
            DrawCommand::Line {
                from,
                to,
                color,
                alpha,
            } => write!(
                f,
                "line {:.1},{:.1} -> {:.1},{:.1} {color} a{alpha:.2}",
                from.x, from.y, to.x, to.y
            ),
            DrawCommand::Text {
                origin,
                size,
                text,
                color,
                alpha,
            } => write!(
                f,
                "text {:.1},{:.1} s{size:.1} {color} a{alpha:.2} {text:?}",
                origin.x, origin.y
            ),
        }
    }
}

/// A finished frame: the ordered commands one draw pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// The recorded commands in paint order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the text of every text command.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for DrawList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{command}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------------

/// The drawing context.
///
/// State changes are scoped with [`save`](Self::save) /
/// [`restore`](Self::restore) or, preferably, [`scoped`](Self::scoped).
#[derive(Debug, Default)]
pub struct Graphics {
    commands: Vec<DrawCommand>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Graphics {
    /// Create an empty context with the default state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the current state.
    pub fn save(&mut self) -> &mut Self {
        self.stack.push(self.state);
        self
    }

    /// Pop the last saved state. An unbalanced restore is ignored.
    pub fn restore(&mut self) -> &mut Self {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => debug!("unbalanced graphics restore ignored"),
        }
        self
    }

    /// Run `f` between a save and its matching restore.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.stack.len();
        self.save();
        let result = f(self);
        // Discard anything `f` saved without restoring.
        self.stack.truncate(depth + 1);
        self.restore();
        result
    }

    /// Number of saved states.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current state.
    pub fn state(&self) -> &DrawState {
        &self.state
    }

    // ── State ────────────────────────────────────────────────────────

    /// Move the origin by `(x, y)` local units.
    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        let t = &mut self.state.transform;
        t.tx += x * t.scale;
        t.ty += y * t.scale;
        self
    }

    /// Scale subsequent drawing uniformly.
    pub fn scale(&mut self, factor: f32) -> &mut Self {
        self.state.transform.scale *= factor;
        self
    }

    /// Multiply the group opacity by `alpha`.
    pub fn multiply_alpha(&mut self, alpha: f32) -> &mut Self {
        self.state.alpha *= alpha.clamp(0.0, 1.0);
        self
    }

    /// Set the fill/stroke color.
    pub fn rgb(&mut self, r: f32, g: f32, b: f32) -> &mut Self {
        self.state.color = Color::rgb(r, g, b);
        self
    }

    /// Set a gray fill/stroke color.
    pub fn gray(&mut self, v: f32) -> &mut Self {
        self.state.color = Color::gray(v);
        self
    }

    /// Set the color from a [`Color`].
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.state.color = color;
        self
    }

    /// Set the font size in local units.
    pub fn font_size(&mut self, size: f32) -> &mut Self {
        self.state.font_size = size;
        self
    }

    // ── Shapes ───────────────────────────────────────────────────────

    /// Fill a rectangle given by its top-left corner and size.
    pub fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        let origin = self.state.transform.apply(Point::new(x, y));
        let rect = Rect::new(
            origin.x,
            origin.y,
            self.state.transform.apply_len(width),
            self.state.transform.apply_len(height),
        );
        self.push(|color, alpha| DrawCommand::Rect { rect, color, alpha })
    }

    /// Fill the display-sized square around the local origin.
    ///
    /// Follows the transform, so a background slides with its view during
    /// a swipe.
    pub fn clear(&mut self) -> &mut Self {
        let screen = Rect::screen();
        self.rectangle(screen.x, screen.y, screen.width, screen.height)
    }

    /// Fill a circle.
    pub fn circle(&mut self, x: f32, y: f32, radius: f32) -> &mut Self {
        let center = self.state.transform.apply(Point::new(x, y));
        let radius = self.state.transform.apply_len(radius);
        self.push(|color, alpha| DrawCommand::Circle {
            center,
            radius,
            color,
            alpha,
        })
    }

    /// Stroke a line segment.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> &mut Self {
        let from = self.state.transform.apply(Point::new(x1, y1));
        let to = self.state.transform.apply(Point::new(x2, y2));
        self.push(|color, alpha| DrawCommand::Line {
            from,
            to,
            color,
            alpha,
        })
    }

    /// Draw text with its left baseline at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>) -> &mut Self {
        let origin = self.state.transform.apply(Point::new(x, y));
        let size = self.state.transform.apply_len(self.state.font_size);
        let text = text.into();
        self.push(|color, alpha| DrawCommand::Text {
            origin,
            size,
            text,
            color,
            alpha,
        })
    }

    /// Draw text horizontally centered on `x`.
    pub fn text_centered(&mut self, x: f32, y: f32, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        let width = self.text_width(&text);
        self.text(x - width / 2.0, y, text)
    }

    /// Approximate advance width of `text` at the current font size, in
    /// local units.
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.state.font_size * 0.6
    }

    /// Take the recorded commands and reset the context for the next frame.
    pub fn finish(&mut self) -> DrawList {
        if !self.stack.is_empty() {
            debug!(depth = self.stack.len(), "frame finished with unrestored state");
        }
        self.stack.clear();
        self.state = DrawState::default();
        DrawList {
            commands: std::mem::take(&mut self.commands),
        }
    }

    fn push(&mut self, make: impl FnOnce(Color, f32) -> DrawCommand) -> &mut Self {
        if self.state.alpha > 0.0 {
            self.commands.push(make(self.state.color, self.state.alpha));
        }
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_resolved_against_transform() {
        let mut g = Graphics::new();
        g.translate(10.0, 5.0).scale(2.0).rectangle(1.0, 1.0, 3.0, 4.0);
        let list = g.finish();
        insta::assert_snapshot!(list.to_string().trim_end(), @"rect 12.0,7.0 6.0x8.0 #ffffff a1.00");
    }

    #[test]
    fn scoped_restores_state() {
        let mut g = Graphics::new();
        g.scoped(|g| {
            g.translate(50.0, 0.0).gray(0.5).multiply_alpha(0.5);
        });
        assert_eq!(*g.state(), DrawState::default());
        assert_eq!(g.depth(), 0);
    }

    #[test]
    fn scoped_discards_leaked_saves() {
        let mut g = Graphics::new();
        g.scoped(|g| {
            g.save().save().translate(1.0, 1.0);
        });
        assert_eq!(g.depth(), 0);
        assert_eq!(*g.state(), DrawState::default());
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut g = Graphics::new();
        g.translate(3.0, 3.0);
        g.restore();
        assert_eq!(g.state().transform.tx, 3.0);
    }

    #[test]
    fn alpha_multiplies_in_nested_groups() {
        let mut g = Graphics::new();
        g.multiply_alpha(0.5);
        g.scoped(|g| {
            g.multiply_alpha(0.5).circle(0.0, 0.0, 10.0);
        });
        let list = g.finish();
        assert_eq!(list.commands()[0].alpha(), 0.25);
    }

    #[test]
    fn fully_transparent_draws_are_dropped() {
        let mut g = Graphics::new();
        g.multiply_alpha(0.0).text(0.0, 0.0, "hidden");
        assert!(g.finish().is_empty());
    }

    #[test]
    fn clear_follows_transform() {
        let mut g = Graphics::new();
        g.gray(0.0).clear();
        g.translate(100.0, 0.0).clear();
        let list = g.finish();
        insta::assert_snapshot!(list.to_string().trim_end(), @r"
        rect -120.0,-120.0 240.0x240.0 #000000 a1.00
        rect -20.0,-120.0 240.0x240.0 #000000 a1.00
        ");
    }

    #[test]
    fn text_centering_and_listing() {
        let mut g = Graphics::new();
        g.font_size(10.0).text_centered(0.0, 0.0, "abcd");
        let list = g.finish();
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["abcd"]);
        match &list.commands()[0] {
            DrawCommand::Text { origin, .. } => assert_eq!(origin.x, -12.0),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn finish_resets_context() {
        let mut g = Graphics::new();
        g.save().translate(5.0, 5.0).line(0.0, 0.0, 1.0, 1.0);
        assert_eq!(g.finish().len(), 1);
        assert_eq!(g.depth(), 0);
        assert!(g.finish().is_empty());
    }

    #[test]
    fn color_display_is_hex() {
        assert_eq!(Color::rgb(1.0, 0.5, 0.0).to_string(), "#ff8000");
        assert_eq!(Color::gray(2.0).to_string(), "#ffffff");
    }
}
