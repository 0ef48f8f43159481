//! Coordinate types and the projection helpers built on them.
//!
//! A [`Coord`] is a bare `(x, y)` pair in whatever unit the surrounding code
//! works in: meters in a projected space, degrees in geographic space, or
//! the fractional `[0, 1]` space produced by [`Rect::convert_local`].

pub mod polygon;
pub mod projection;
pub mod rect;

pub use polygon::{Mask, Polygon};
pub use rect::Rect;

use std::ops::{Add, Div, Mul, Sub};

/// A 2D point or offset. Copyable and immutable once formed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A coordinate that no data source can resolve. Used to poison a batch
    /// slot when a projection fails for a single point.
    pub const INVALID: Self = Self {
        x: f64::NAN,
        y: f64::NAN,
    };

    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// True if either component is NaN.
    #[must_use]
    pub fn has_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

impl Add for Coord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Coord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Componentwise product, used for local/global rectangle conversion.
impl Mul for Coord {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }
}

/// Componentwise quotient, used for local/global rectangle conversion.
impl Div for Coord {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Self::new(self.x / other.x, self.y / other.y)
    }
}

impl Mul<f64> for Coord {
    type Output = Self;

    fn mul(self, c: f64) -> Self {
        Self::new(self.x * c, self.y * c)
    }
}

impl Div<f64> for Coord {
    type Output = Self;

    fn div(self, c: f64) -> Self {
        Self::new(self.x / c, self.y / c)
    }
}
