//! Axis-aligned rectangles with local/global fractional conversion.

use super::{Coord, Polygon};

/// A rectangle spanning `min` to `max`.
///
/// Width and height may be negative: swath blocks are stored with whatever
/// axis orientation the native projection uses, and the local/global
/// conversion divides through the signed size, so a flipped axis still maps
/// into `[0, 1]` correctly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    min: Coord,
    max: Coord,
}

impl Rect {
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            min: Coord::new(left, top),
            max: Coord::new(right, bottom),
        }
    }

    #[must_use]
    pub const fn from_corners(top_left: Coord, bottom_right: Coord) -> Self {
        Self {
            min: top_left,
            max: bottom_right,
        }
    }

    /// A rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: Coord, size: Coord) -> Self {
        let origin = center - size / 2.0;
        Self::from_corners(origin, origin + size)
    }

    #[must_use]
    pub fn left(&self) -> f64 {
        self.min.x
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.max.x
    }

    #[must_use]
    pub fn top(&self) -> f64 {
        self.min.y
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.max.y
    }

    /// Signed width (`right - left`).
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Signed height (`bottom - top`).
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn size(&self) -> Coord {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Coord {
        (self.min + self.max) / 2.0
    }

    #[must_use]
    pub fn top_left(&self) -> Coord {
        self.min
    }

    #[must_use]
    pub fn top_right(&self) -> Coord {
        Coord::new(self.max.x, self.min.y)
    }

    #[must_use]
    pub fn bottom_left(&self) -> Coord {
        Coord::new(self.min.x, self.max.y)
    }

    #[must_use]
    pub fn bottom_right(&self) -> Coord {
        self.max
    }

    /// Convert a global coordinate into this rectangle's `[0, 1] x [0, 1]`
    /// local space. Points outside the rectangle map outside `[0, 1]`.
    #[must_use]
    pub fn convert_local(&self, point: Coord) -> Coord {
        (point - self.top_left()) / self.size()
    }

    /// Convert a local `[0, 1] x [0, 1]` coordinate back to global space.
    /// Inverse of [`Self::convert_local`] up to floating-point rounding.
    #[must_use]
    pub fn convert_global(&self, point: Coord) -> Coord {
        point * self.size() + self.top_left()
    }

    #[must_use]
    pub fn contains(&self, point: Coord) -> bool {
        let local = self.convert_local(point);
        (0.0..=1.0).contains(&local.x) && (0.0..=1.0).contains(&local.y)
    }

    /// Grow this rectangle to cover `other` as well.
    pub fn include(&mut self, other: &Rect) {
        if other.min.x < self.min.x {
            self.min.x = other.min.x;
        }
        if other.max.x > self.max.x {
            self.max.x = other.max.x;
        }
        if other.min.y < self.min.y {
            self.min.y = other.min.y;
        }
        if other.max.y > self.max.y {
            self.max.y = other.max.y;
        }
    }

    #[must_use]
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_vertices(vec![
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ])
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}
