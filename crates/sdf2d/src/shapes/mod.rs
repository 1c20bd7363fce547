//! Shapes: signed distance functions in the XY plane.
//!
//! Every shape is a pure function from a point to a signed distance
//! (negative inside, positive outside, zero on the surface) plus a rectangle
//! that fully encloses its surface. Shapes are shared as [`ShapeRef`] so one
//! shape can be applied to many chunks and kept in a layer's history.
//!
//! ```text
//!   Primitives            Combinators (wrap a ShapeRef)
//!   ──────────            ─────────────────────────────
//!   RectSdf               Translate  - offset
//!   CircleSdf             Transform  - translation, rotation, uniform scale
//!   LineSdf               Expand     - Minkowski dilation by a margin
//!   TextureSdf
//! ```
//!
//! Persistence goes through [`ShapeRegistry`]: a `u16` type tag followed by
//! the shape's little-endian payload. Wrappers write their inner shape first.

mod combinators;
mod primitives;
mod registry;
mod texture;

use std::fmt;
use std::sync::Arc;

use glam::Vec2;

use crate::error::ShapeError;
use crate::types::Aabb2;

pub use combinators::{Expand, Transform, Translate};
pub use primitives::{CircleSdf, LineSdf, RectSdf};
pub use registry::{ShapeReader, ShapeRegistry, ShapeWriter};
pub use texture::TextureSdf;

/// Signed distance function with conservative bounds.
pub trait DistanceField {
  /// Rectangle enclosing the whole surface.
  fn bounds(&self) -> Aabb2;

  /// Signed distance at `point`: negative inside, positive outside.
  fn distance(&self, point: Vec2) -> f32;
}

/// A distance field that can be stored in a layer history and persisted.
pub trait Shape: DistanceField + fmt::Debug + Send + Sync {
  /// Registry name of this shape's type.
  fn type_name(&self) -> &'static str;

  /// Write the payload (everything after the type tag).
  fn write_payload(
    &self,
    writer: &mut ShapeWriter,
    registry: &ShapeRegistry,
  ) -> Result<(), ShapeError>;
}

/// Shapes that can be registered for reading.
pub trait ShapeType: Shape + Sized + 'static {
  const TYPE_NAME: &'static str;

  /// Read the payload written by [`Shape::write_payload`].
  fn read_payload(reader: &mut ShapeReader<'_>, registry: &ShapeRegistry)
    -> Result<Self, ShapeError>;
}

/// Shared, immutable shape handle.
pub type ShapeRef = Arc<dyn Shape>;


#[cfg(test)]
#[path = "combinators_test.rs"]
mod combinators_test;
