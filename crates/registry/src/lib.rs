//! The marker position registry: identifiers, bounding boxes, and the JSON
//! artifact they are flushed to at the end of a build.

#![forbid(unsafe_code)]

pub mod bbox;
pub mod destination;
pub mod id;
mod registry;

pub use bbox::BoundingBox;
pub use destination::{Destination, DestinationError};
pub use id::MarkerId;
pub use registry::{FlushMode, FlushSummary, Registry};
