//! Deterministic layout host for exercising markers end to end.
//!
//! [`FlowEngine`] is a deliberately small flow layout: inline items are set
//! left to right into lines of the page's content width, lines are stacked
//! top to bottom and move to the next page when they do not fit. Items are
//! top-aligned within a line.

#![forbid(unsafe_code)]

mod flow;

pub use flow::{FlowEngine, PageGeometry};
