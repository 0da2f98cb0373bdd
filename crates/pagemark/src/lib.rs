//! Position markers for typeset documents.
//!
//! A marker is a small square placed inline in a document. Its final page and
//! coordinates are only known once the layout engine has broken lines and
//! pages, so placing a marker registers a deferred callback with the build;
//! the callback fires when the engine reports the marker's resolved position
//! and records the marker's bounding box, in a physical unit, into the
//! registry that is flushed to JSON when the build finishes.

#![forbid(unsafe_code)]

pub mod config;
pub mod element;
pub mod host;
/// Build context: marker declaration, resolution and the final flush
mod recorder;

pub use config::RecorderConfig;
pub use element::{ElementKey, MarkerElement};
pub use host::{LayoutHost, Position, Resolution};
pub use pagemark_registry::{BoundingBox, FlushMode, MarkerId, Registry};
pub use pagemark_units::{Length, PhysicalLength, PhysicalUnit, to_physical};
pub use recorder::{
    BuildContext, BuildReport, MarkerHandle, MarkerOptions, MarkerState, PassError, PassSummary,
    ResolveError, bounding_box,
};
