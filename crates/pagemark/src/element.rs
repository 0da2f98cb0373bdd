//! The visual element a marker contributes to the document.

use core::fmt;

use pagemark_units::Length;

/// Key the layout engine assigns to an element it accepted into the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

impl fmt::Display for ElementKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// A square placeholder of edge `size`.
///
/// `outset` grows the painted square on every side without affecting layout:
/// the element advances the flow by `size` and its anchor is the top-left
/// corner of the unexpanded square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerElement {
    pub size: Length,
    pub outset: Length,
}

impl MarkerElement {
    pub fn new(size: Length, outset: Length) -> Self {
        Self { size, outset }
    }

    /// Edge length of the painted square, `size + 2 * outset`, never negative.
    pub fn visual_extent(&self) -> Length {
        (self.size + self.outset * 2.0).max(Length::ZERO)
    }
}
