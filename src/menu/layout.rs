//! Menu layouts. A layout only draws; input handling lives in
//! [`MenuController`](super::MenuController).

use std::f32::consts::{PI, TAU};

use crate::geometry::{ease_out_cubic, lerp, Point, HALF_EXTENT};
use crate::graphics::{Color, Graphics};

use super::MenuItem;

/// How a menu arranges its items.
pub trait MenuLayout {
    /// Draw `items` with the scroll animation at `position`.
    fn draw(&self, g: &mut Graphics, items: &[Box<dyn MenuItem>], position: f32);

    /// Advance layout-owned animation.
    fn think(&mut self, _delta_ms: u32) {}
}

fn background(g: &mut Graphics) {
    g.scoped(|g| {
        g.gray(0.0).clear();
    });
}

// ---------------------------------------------------------------------------
// ListLayout
// ---------------------------------------------------------------------------

/// One item per line, the selected one centered and largest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListLayout;

impl ListLayout {
    pub const SIZE_LARGE: f32 = 30.0;
    pub const SIZE_SMALL: f32 = 20.0;
}

impl MenuLayout for ListLayout {
    fn draw(&self, g: &mut Graphics, items: &[Box<dyn MenuItem>], position: f32) {
        background(g);
        for (index, item) in items.iter().enumerate() {
            let offset = (index as f32 - position) * Self::SIZE_LARGE;
            if offset < -HALF_EXTENT - Self::SIZE_LARGE || offset > HALF_EXTENT {
                continue;
            }
            let shrink = (offset / Self::SIZE_SMALL).abs().min(1.0);
            let scale = lerp(1.0, Self::SIZE_SMALL / Self::SIZE_LARGE, shrink);
            g.scoped(|g| {
                g.gray(1.0)
                    .font_size(Self::SIZE_LARGE)
                    .translate(0.0, offset)
                    .scale(scale);
                item.draw(g);
            });
        }
    }
}

// ---------------------------------------------------------------------------
// SunLayout
// ---------------------------------------------------------------------------

/// Items fanned along an arc around a rotating sun at the left edge.
#[derive(Debug, Clone, Default)]
pub struct SunLayout {
    elapsed_ms: u64,
}

impl SunLayout {
    /// Angular distance between neighboring items, in radians.
    pub const SPREAD: f32 = 0.35;
    const RADIUS: f32 = 150.0;
    const RAYS: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    fn sun_center() -> Point {
        Point::new(-HALF_EXTENT, 0.0)
    }
}

impl MenuLayout for SunLayout {
    fn draw(&self, g: &mut Graphics, items: &[Box<dyn MenuItem>], position: f32) {
        background(g);
        let center = Self::sun_center();
        let spin = (self.elapsed_ms % 40_000) as f32 / 4000.0;

        g.scoped(|g| {
            g.rgb(0.5, 0.5, 0.0);
            for ray in 0..Self::RAYS {
                let angle = (ray as f32 * TAU / Self::RAYS as f32 + spin) % TAU;
                // Rays pointing back off the display are skipped.
                if angle > PI * 0.65 && angle < PI * 1.35 {
                    continue;
                }
                let inner = center + Point::polar(60.0, angle + PI / 2.0);
                let outer = center + Point::polar(260.0, angle + PI / 2.0);
                g.line(inner.x, inner.y, outer.x, outer.y);
            }
            g.rgb(0.92, 0.89, 0.0).circle(center.x, center.y, 50.0);
        });

        for (index, item) in items.iter().enumerate() {
            let distance = index as f32 - position;
            let angle = PI / 2.0 + distance * Self::SPREAD;
            if (angle - PI / 2.0).abs() > PI / 2.0 {
                continue;
            }
            let at = center + Point::polar(Self::RADIUS, angle);
            let emphasis = ease_out_cubic(1.0 - distance.abs().min(1.0));
            g.scoped(|g| {
                g.color(Color::gray(lerp(0.6, 1.0, emphasis)))
                    .font_size(lerp(18.0, 26.0, emphasis))
                    .translate(at.x, at.y);
                item.draw(g);
            });
        }
    }

    fn think(&mut self, delta_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.wrapping_add(u64::from(delta_ms));
    }
}

// ---------------------------------------------------------------------------
// RingLayout
// ---------------------------------------------------------------------------

/// Items evenly spaced on a ring, rotated so the selection sits at the top,
/// with a title in the middle.
#[derive(Debug, Clone)]
pub struct RingLayout {
    title: String,
    radius: f32,
}

impl RingLayout {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            radius: 80.0,
        }
    }

    /// Ring radius (builder).
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Angle of item `index` of `count` at scroll `position`. Zero is the top.
    pub fn angle(index: usize, count: usize, position: f32) -> f32 {
        if count == 0 {
            return 0.0;
        }
        TAU * (index as f32 - position) / count as f32
    }
}

impl MenuLayout for RingLayout {
    fn draw(&self, g: &mut Graphics, items: &[Box<dyn MenuItem>], position: f32) {
        background(g);
        g.scoped(|g| {
            g.gray(1.0).font_size(24.0).text_centered(0.0, 0.0, self.title.as_str());
        });
        let selected = position.round();
        for (index, item) in items.iter().enumerate() {
            let at = Point::polar(self.radius, Self::angle(index, items.len(), position));
            let highlighted = index as f32 == selected;
            g.scoped(|g| {
                g.gray(if highlighted { 1.0 } else { 0.5 })
                    .font_size(16.0)
                    .translate(at.x, at.y);
                item.draw(g);
            });
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::DrawCommand;
    use crate::menu::MenuItemNoop;

    fn items(labels: &[&str]) -> Vec<Box<dyn MenuItem>> {
        labels
            .iter()
            .map(|l| Box::new(MenuItemNoop::new(*l)) as Box<dyn MenuItem>)
            .collect()
    }

    fn text_origin(g: &mut Graphics, label: &str) -> Option<Point> {
        g.finish().commands().iter().find_map(|c| match c {
            DrawCommand::Text { origin, text, .. } if text == label => Some(*origin),
            _ => None,
        })
    }

    // ── ListLayout ───────────────────────────────────────────────────

    #[test]
    fn list_shrinks_neighbors() {
        let mut g = Graphics::new();
        ListLayout.draw(&mut g, &items(&["a", "b"]), 0.0);
        insta::assert_snapshot!(g.finish().to_string().trim_end(), @r#"
        rect -120.0,-120.0 240.0x240.0 #000000 a1.00
        text -9.0,0.0 s30.0 #ffffff a1.00 "a"
        text -6.0,30.0 s20.0 #ffffff a1.00 "b"
        "#);
    }

    #[test]
    fn list_culls_offscreen_items() {
        let labels: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let mut g = Graphics::new();
        ListLayout.draw(&mut g, &items(&refs), 10.0);
        let list = g.finish();
        let drawn: Vec<&str> = list.texts().collect();
        assert_eq!(drawn.first(), Some(&"5"));
        assert_eq!(drawn.last(), Some(&"14"));
    }

    // ── RingLayout ───────────────────────────────────────────────────

    #[test]
    fn ring_puts_selection_on_top() {
        let ring = RingLayout::new("apps");
        let menu = items(&["a", "b", "c", "d"]);
        let mut g = Graphics::new();
        ring.draw(&mut g, &menu, 2.0);
        let origin = text_origin(&mut g, "c").unwrap();
        assert!(origin.y < -79.0, "selected item at {origin:?}");
    }

    #[test]
    fn ring_angles() {
        assert_eq!(RingLayout::angle(0, 4, 0.0), 0.0);
        assert!((RingLayout::angle(1, 4, 0.0) - TAU / 4.0).abs() < 1e-6);
        assert!((RingLayout::angle(0, 4, 1.0) + TAU / 4.0).abs() < 1e-6);
        assert_eq!(RingLayout::angle(3, 0, 1.0), 0.0);
    }

    // ── SunLayout ────────────────────────────────────────────────────

    #[test]
    fn sun_emphasizes_selection() {
        let mut sun = SunLayout::new();
        sun.think(1234);
        let menu = items(&["a", "b", "c"]);
        let mut g = Graphics::new();
        sun.draw(&mut g, &menu, 1.0);
        let list = g.finish();
        let sizes: Vec<(String, f32)> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, size, .. } => Some((text.clone(), *size)),
                _ => None,
            })
            .collect();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes[1], ("b".to_string(), 26.0));
        assert_eq!(sizes[0].1, 18.0);
        // The selected item sits level with the sun, to its right.
        let b = list
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Text { origin, text, .. } if text == "b" => Some(*origin),
                _ => None,
            })
            .unwrap();
        assert!(b.y.abs() < 1.0);
        assert!(b.x > 0.0);
    }
}
