pub mod camera;
pub mod export;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;
pub mod snapshot;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM};
pub use export::export_mermaid;
pub use geometry::{Point, Rect, Size};
pub use id::{ConnectionId, NoteId};
pub use layout::{LayoutConfig, LayoutDirection, LayoutResult, auto_layout};
pub use model::*;
pub use snapshot::BoardSnapshot;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
