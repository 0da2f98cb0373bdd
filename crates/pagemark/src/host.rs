//! The seam between markers and the layout engine that places them.

use pagemark_units::Length;

use crate::{ElementKey, MarkerElement};

/// Resolved placement of an element: 1-based page and the anchor point
/// relative to the page's top-left corner, y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub page: usize,
    pub x: Length,
    pub y: Length,
}

/// One event of the engine's post-layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub key: ElementKey,
    pub position: Position,
}

/// What a layout engine must provide to host markers.
pub trait LayoutHost {
    /// Append `element` inline at the current flow position and return the
    /// key its resolution will be reported under.
    fn push_inline(&mut self, element: MarkerElement) -> ElementKey;

    /// Lay out the document and report the final position of every placed
    /// element, in the order the engine visits them. Elements the engine
    /// dropped are absent.
    fn layout(&mut self) -> Vec<Resolution>;
}
