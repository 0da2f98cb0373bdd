//! Lengths as the layout engine hands them out, and their conversion into the
//! physical unit recorded in the marker registry.

#![forbid(unsafe_code)]

pub mod length;
pub mod physical;

pub use length::Length;
pub use physical::{PhysicalLength, PhysicalUnit, round_to_hundredths, to_physical};
