//! Layout lengths in typographic points.

use core::ops::{Add, Mul, Sub};

use crate::PhysicalUnit;

/// A length in the layout engine's native unit, the typographic point (1/72 in).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Length {
    points: f64,
}

impl Length {
    /// The zero length.
    pub const ZERO: Self = Self { points: 0.0 };

    /// Create a length from points.
    #[inline]
    pub const fn pt(points: f64) -> Self {
        Self { points }
    }

    /// Create a length from centimeters.
    #[inline]
    pub fn cm(value: f64) -> Self {
        Self::from_unit(value, PhysicalUnit::Centimeters)
    }

    /// Create a length from millimeters.
    #[inline]
    pub fn mm(value: f64) -> Self {
        Self::from_unit(value, PhysicalUnit::Millimeters)
    }

    /// Create a length from inches.
    #[inline]
    pub fn inches(value: f64) -> Self {
        Self::from_unit(value, PhysicalUnit::Inches)
    }

    /// Create a length from a value expressed in `unit`.
    #[inline]
    pub fn from_unit(value: f64, unit: PhysicalUnit) -> Self {
        Self::pt(value * unit.points_per_unit())
    }

    /// The raw value in points.
    #[inline]
    pub const fn to_pt(self) -> f64 {
        self.points
    }

    /// Whether the length is finite (neither infinite nor NaN).
    #[inline]
    pub const fn is_finite(self) -> bool {
        self.points.is_finite()
    }

    /// Whether the length is strictly below zero.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.points < 0.0
    }

    /// The larger of two lengths.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::pt(self.points.max(other.points))
    }
}

impl Add for Length {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::pt(self.points + rhs.points)
    }
}

impl Sub for Length {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::pt(self.points - rhs.points)
    }
}

impl Mul<f64> for Length {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::pt(self.points * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inches_are_seventy_two_points() {
        assert_eq!(Length::inches(1.0).to_pt(), 72.0);
        assert_eq!(Length::inches(0.5), Length::pt(36.0));
    }

    #[test]
    fn arithmetic_stays_in_points() {
        let sum = Length::pt(10.0) + Length::pt(2.5) * 2.0;
        assert_eq!(sum.to_pt(), 15.0);
        assert_eq!((sum - Length::pt(5.0)).to_pt(), 10.0);
        assert!(Length::pt(-1.0).is_negative());
        assert!(!Length::ZERO.is_negative());
    }
}
