//! Display geometry: points, rectangles and the fixed display extent.
//!
//! The display is round and addressed in a coordinate space centered at the
//! origin, `[-120, 120]` on both axes, with `+y` pointing down. Every
//! [`Responder`](crate::responder::Responder) draws into this space.

use std::ops::{Add, Mul, Neg, Sub};

/// Half of the display's width/height in drawing units.
pub const HALF_EXTENT: f32 = 120.0;

/// Full display width in drawing units. Swipe transitions travel this far.
pub const DISPLAY_WIDTH: f32 = HALF_EXTENT * 2.0;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A position or displacement in drawing units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point on a circle of radius `r` around the origin, `angle` in radians.
    ///
    /// Angle zero points up (towards negative `y`), increasing clockwise.
    #[inline]
    pub fn polar(r: f32, angle: f32) -> Self {
        Self {
            x: r * angle.sin(),
            y: -r * angle.cos(),
        }
    }

    /// Linearly interpolate between `self` and `other` by `factor`.
    #[inline]
    pub fn lerp(self, other: Point, factor: f32) -> Point {
        Point {
            x: lerp(self.x, other.x, factor),
            y: lerp(self.y, other.y, factor),
        }
    }

    /// Euclidean distance from the origin.
    #[inline]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole display.
    pub const fn screen() -> Self {
        Self::new(-HALF_EXTENT, -HALF_EXTENT, DISPLAY_WIDTH, DISPLAY_WIDTH)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `p` lies inside this rectangle.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Overlapping area of two rectangles, or a zero-sized rect if disjoint.
    pub fn intersection(&self, other: Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return Rect::new(x, y, 0.0, 0.0);
        }
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Linear interpolation, `t = 0` yields `a`, `t = 1` yields `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-out over `t ∈ [0, 1]`.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) - 1.0;
    t * t * t + 1.0
}

// ===========================================================================
// Tests
// ===========================================================================
