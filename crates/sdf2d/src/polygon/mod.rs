//! Polygon builder: traced loops to extruded, clipped triangle meshes.
//!
//! ```text
//!   Contours ─► Triangulator ─► cap triangles (shared by both caps)
//!            └► extrude ─────► front cap / back cap / wall streams
//!                                   │
//!                                   └─► clip_to_rect (chunk square)
//! ```

pub mod clip;
pub mod extrude;
pub mod triangulate;

pub use clip::{clip_to_rect, ClipVertex};
pub use extrude::{extrude, ExtrudeParams, Profile, ProfileRow};
pub use triangulate::{PolygonGroup, Triangulator};
