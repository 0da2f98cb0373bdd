//! Page-relative bounding boxes in physical units.

use pagemark_units::PhysicalLength;
use serde::{Deserialize, Serialize};

/// Where a marker landed: the 1-based page and the horizontal and vertical
/// extent, each as `(start, start + size)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub page: usize,
    pub x: (PhysicalLength, PhysicalLength),
    pub y: (PhysicalLength, PhysicalLength),
}

impl BoundingBox {
    /// Horizontal extent, `x.1 - x.0`.
    pub fn width(&self) -> f64 {
        self.x.1.get() - self.x.0.get()
    }

    /// Vertical extent, `y.1 - y.0`.
    pub fn height(&self) -> f64 {
        self.y.1.get() - self.y.0.get()
    }

    /// Whether the box has no area.
    pub fn is_degenerate(&self) -> bool {
        self.x.0 == self.x.1 || self.y.0 == self.y.1
    }
}
