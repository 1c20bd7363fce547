//! Error types.
//!
//! Geometric degeneracy (tiny or open loops) is not an error: the tracer drops
//! it silently. `MeshError` never leaves the mesher; it is logged and the
//! chunk falls back to an empty mesh.

use thiserror::Error;

/// Shape serialization errors.
#[derive(Error, Debug)]
pub enum ShapeError {
  #[error("unexpected end of shape data: needed {needed} bytes, {remaining} left")]
  UnexpectedEof { needed: usize, remaining: usize },

  #[error("unknown shape tag {0}")]
  UnknownTag(u16),

  #[error("shape type `{0}` is not registered")]
  UnregisteredType(String),

  #[error("shape type `{0}` is already registered")]
  DuplicateType(String),

  #[error("invalid UTF-8 in shape data")]
  InvalidUtf8(#[from] std::string::FromUtf8Error),

  #[error("invalid shape data: {0}")]
  InvalidData(String),

  #[error("failed to load texture `{path}`: {source}")]
  Texture {
    path: String,
    #[source]
    source: image::ImageError,
  },
}

/// Polygon builder failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
  #[error("ear clipping stalled with {remaining} vertices left")]
  Triangulation { remaining: usize },

  #[error("hole loop {index} is not inside any outer loop")]
  OrphanHole { index: usize },

  #[error("non-finite vertex in loop {index}")]
  NonFinite { index: usize },
}

/// World-level errors.
#[derive(Error, Debug)]
pub enum WorldError {
  #[error("unknown layer {0}")]
  UnknownLayer(usize),

  #[error(transparent)]
  Shape(#[from] ShapeError),
}
