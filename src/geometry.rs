//! Core geometry types: Point, Rect, Spacing.
//!
//! All coordinates are in pixels. An element's rect is relative to its parent;
//! conversion to and from root coordinates is done by the element tree.

use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D position or displacement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to `other`.
    #[inline]
    pub fn manhattan_distance(self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point { x: -self.x, y: -self.y }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle: position plus size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const EMPTY: Rect = Rect { x: 0, y: 0, w: 0, h: 0 };

    /// Create a new rect.
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the rect covers no area.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Whether the point lies inside (left/top inclusive, right/bottom exclusive).
    #[inline]
    pub const fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.w && p.y < self.y + self.h
    }

    /// Whether the two rects overlap.
    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// The overlapping part of two rects, or [`Rect::EMPTY`] if they don't overlap.
    pub fn clip(self, other: Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.w).min(other.x + other.w);
        let bottom = (self.y + self.h).min(other.y + other.h);
        if right <= x || bottom <= y {
            return Rect::EMPTY;
        }
        Rect::new(x, y, right - x, bottom - y)
    }

    /// The smallest rect containing both. Empty rects are ignored.
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Translate by `dx`/`dy`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Shrink the rect by `spacing` on each side.
    pub fn shrink(self, spacing: Spacing) -> Rect {
        Rect::new(
            self.x + spacing.left,
            self.y + spacing.top,
            (self.w - spacing.horizontal()).max(0),
            (self.h - spacing.vertical()).max(0),
        )
    }

    /// Move the rect so it fits inside `bounds` if possible.
    pub fn move_in(self, bounds: Rect) -> Rect {
        let x = self.x.min(bounds.x + bounds.w - self.w).max(bounds.x);
        let y = self.y.min(bounds.y + bounds.h - self.h).max(bounds.y);
        Rect::new(x, y, self.w, self.h)
    }

    /// Center the rect inside `bounds`, keeping its size.
    pub fn center_in(self, bounds: Rect) -> Rect {
        Rect::new(
            bounds.x + (bounds.w - self.w) / 2,
            bounds.y + (bounds.h - self.h) / 2,
            self.w,
            self.h,
        )
    }

    /// Linear interpolation between `self` and `other`; `t = 0.0` gives `self`.
    pub fn lerp(self, other: Rect, t: f32) -> Rect {
        let mix = |a: i32, b: i32| a + ((b - a) as f32 * t).round() as i32;
        Rect::new(
            mix(self.x, other.x),
            mix(self.y, other.y),
            mix(self.w, other.w),
            mix(self.h, other.h),
        )
    }
}

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Per-side spacing (padding) in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Spacing {
    /// Create spacing from all four sides (CSS order: top, right, bottom, left).
    #[inline]
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self { top, right, bottom, left }
    }

    /// The same spacing on every side.
    #[inline]
    pub const fn all(v: i32) -> Self {
        Self::new(v, v, v, v)
    }

    /// `left + right`.
    #[inline]
    pub const fn horizontal(self) -> i32 {
        self.left + self.right
    }

    /// `top + bottom`.
    #[inline]
    pub const fn vertical(self) -> i32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(14, 14)));
        assert!(!r.contains(Point::new(15, 10)));
        assert!(!r.contains(Point::new(9, 12)));
    }

    #[test]
    fn test_rect_clip_and_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert!(a.intersects(b));
        assert_eq!(a.clip(b), Rect::new(5, 5, 5, 5));

        let c = Rect::new(20, 20, 1, 1);
        assert!(!a.intersects(c));
        assert_eq!(a.clip(c), Rect::EMPTY);
    }

    #[test]
    fn test_rect_union_ignores_empty() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.union(Rect::EMPTY), a);
        assert_eq!(Rect::EMPTY.union(a), a);
        assert_eq!(a.union(Rect::new(20, 0, 5, 5)), Rect::new(0, 0, 25, 10));
    }

    #[test]
    fn test_rect_move_in_and_center_in() {
        let bounds = Rect::new(0, 0, 100, 100);
        assert_eq!(Rect::new(90, -5, 20, 20).move_in(bounds), Rect::new(80, 0, 20, 20));
        assert_eq!(Rect::new(0, 0, 20, 10).center_in(bounds), Rect::new(40, 45, 20, 10));
    }

    #[test]
    fn test_rect_shrink_clamps() {
        let r = Rect::new(0, 0, 10, 4).shrink(Spacing::all(3));
        assert_eq!(r, Rect::new(3, 3, 4, 0));
        assert!(r.is_empty());
    }

    #[test]
    fn test_rect_lerp_endpoints() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(100, 50, 20, 30);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rect::new(50, 25, 15, 20));
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(3, 4) + Point::new(1, 1) - Point::new(2, 0);
        assert_eq!(p, Point::new(2, 5));
        assert_eq!(-p, Point::new(-2, -5));
        assert_eq!(Point::new(0, 0).manhattan_distance(Point::new(3, -4)), 7);
    }
}
