//! Conversion from layout points into a physical unit.
//!
//! Registry values are rounded to two decimal digits with ties rounded away
//! from zero (`f64::round`). Layout lengths handed to the converter are
//! non-negative, so in practice this is round-half-up.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Length;

/// Physical units a registry can be expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PhysicalUnit {
    /// Centimeters (1 cm = 72 / 2.54 pt).
    #[default]
    Centimeters,
    /// Millimeters (1 mm = 72 / 25.4 pt).
    Millimeters,
    /// Inches (1 in = 72 pt).
    Inches,
}

impl PhysicalUnit {
    /// Number of layout points in one unit. This is the `unit_scale` the
    /// converter divides by.
    #[inline]
    pub const fn points_per_unit(self) -> f64 {
        match self {
            Self::Centimeters => 72.0 / 2.54,
            Self::Millimeters => 72.0 / 25.4,
            Self::Inches => 72.0,
        }
    }

    /// Short suffix used in configuration and logs.
    #[inline]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Centimeters => "cm",
            Self::Millimeters => "mm",
            Self::Inches => "in",
        }
    }

    /// Parse a unit suffix (`cm`, `mm`, `in`, `inch`), case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "cm" => Some(Self::Centimeters),
            "mm" => Some(Self::Millimeters),
            "in" | "inch" => Some(Self::Inches),
            _ => None,
        }
    }
}

impl fmt::Display for PhysicalUnit {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.suffix())
    }
}

/// A length in a physical unit, already rounded to two decimal digits.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalLength(f64);

impl PhysicalLength {
    /// The raw rounded value.
    #[inline]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for PhysicalLength {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.2}", self.0)
    }
}

/// Round to two decimal digits, ties away from zero.
#[inline]
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a layout length into `unit`, rounded to two decimal digits.
///
/// Total and pure: `to_physical(length) == round(length / unit_scale, 2)`,
/// monotonic non-decreasing in `length`.
#[inline]
pub fn to_physical(length: Length, unit: PhysicalUnit) -> PhysicalLength {
    PhysicalLength(round_to_hundredths(length.to_pt() / unit.points_per_unit()))
}
