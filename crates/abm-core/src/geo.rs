//! Continuous 2-D coordinates and motion vectors.
//!
//! The world is measured in tile units: tile `(col, row)` covers the half-open
//! square `[col, col + 1) × [row, row + 1)`.  `y` grows towards the south.
//! Both types use `f64` because wall clipping works one ULP away from tile
//! boundaries and needs the extra precision.

use std::ops::{Add, Sub};

/// An immutable position in continuous world space.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// The point reached by applying `motion` to `self`.
    #[inline]
    pub fn translate(self, motion: Motion) -> Point {
        Point::new(self.x + motion.dx, self.y + motion.dy)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// `[x, y]`: the layout `rstar` expects for 2-D points.
    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Add<Motion> for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Motion) -> Point {
        self.translate(rhs)
    }
}

impl Sub for Point {
    type Output = Motion;
    /// The motion that carries `rhs` onto `self`.
    #[inline]
    fn sub(self, rhs: Point) -> Motion {
        Motion::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

/// A displacement vector.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Motion {
    pub dx: f64,
    pub dy: f64,
}

impl Motion {
    pub const ZERO: Motion = Motion { dx: 0.0, dy: 0.0 };

    #[inline]
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Motion of `length` units heading `angle` radians clockwise from east
    /// (clockwise because `y` points south).
    #[inline]
    pub fn polar(angle: f64, length: f64) -> Self {
        Self::new(angle.cos() * length, angle.sin() * length)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dx.hypot(self.dy)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}
