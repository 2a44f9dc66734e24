pub mod hit;
pub mod paint;
pub mod route;

pub use hit::SpatialIndex;
pub use route::{NoteOffset, Route, route_between, route_board, route_to_point};
