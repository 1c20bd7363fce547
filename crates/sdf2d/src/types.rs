//! Core data types shared by sampling, tracing and meshing.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Quantized signed distance sample.
/// Below 127.5 = inside/solid, above = outside/empty.
pub type Sample = u8;

/// Opaque material handle owned by the host renderer.
pub type MaterialId = u32;

/// Distance quantization for byte storage.
///
/// Maps `[-max_distance, +max_distance]` onto `[0, 255]` with the surface at
/// 127.5. Anything further away clamps to the end of the range.
pub mod sdf_conversion {
  use crate::constants::SURFACE;

  /// Convert a distance in world units to a quantized sample.
  ///
  /// # Arguments
  /// * `distance` - Signed distance in world units
  /// * `max_distance` - Distance that maps to the end of the byte range
  #[inline(always)]
  pub fn to_storage(distance: f32, max_distance: f32) -> u8 {
    let scaled = SURFACE + distance / max_distance * SURFACE;
    if scaled.is_nan() {
      return 255;
    }
    scaled.round().clamp(0.0, 255.0) as u8
  }

  /// Convert a quantized sample back to a distance in world units.
  #[inline(always)]
  pub fn to_float(value: u8, max_distance: f32) -> f32 {
    (value as f32 - SURFACE) / SURFACE * max_distance
  }

  /// World units covered by one quantization step.
  #[inline(always)]
  pub fn step(max_distance: f32) -> f32 {
    max_distance / SURFACE
  }
}

/// Axis-aligned rectangle in the XY plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
  pub min: Vec2,
  pub max: Vec2,
}

impl Aabb2 {
  /// Create a rectangle with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: Vec2::splat(f32::INFINITY),
      max: Vec2::splat(f32::NEG_INFINITY),
    }
  }

  pub fn new(min: Vec2, max: Vec2) -> Self {
    Self { min, max }
  }

  pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  /// Smallest rectangle enclosing all points.
  pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
    let mut aabb = Self::empty();
    for point in points {
      aabb.encapsulate(point);
    }
    aabb
  }

  /// Expand to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec2) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  pub fn union(&self, other: &Aabb2) -> Aabb2 {
    Aabb2 {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Grow (or shrink, for negative margins) on every side.
  #[inline]
  pub fn grow(&self, margin: f32) -> Aabb2 {
    Aabb2 {
      min: self.min - Vec2::splat(margin),
      max: self.max + Vec2::splat(margin),
    }
  }

  pub fn translate(&self, offset: Vec2) -> Aabb2 {
    Aabb2 {
      min: self.min + offset,
      max: self.max + offset,
    }
  }

  /// Touching rectangles count as overlapping.
  #[inline]
  pub fn overlaps(&self, other: &Aabb2) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }

  #[inline]
  pub fn contains_point(&self, point: Vec2) -> bool {
    point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
  }

  /// Corners in counter-clockwise order starting at `min`.
  pub fn corners(&self) -> [Vec2; 4] {
    [
      self.min,
      Vec2::new(self.max.x, self.min.y),
      self.max,
      Vec2::new(self.min.x, self.max.y),
    ]
  }

  pub fn size(&self) -> Vec2 {
    self.max - self.min
  }

  pub fn center(&self) -> Vec2 {
    (self.min + self.max) * 0.5
  }

  /// Check if min <= max on both axes.
  pub fn is_valid(&self) -> bool {
    self.min.x <= self.max.x && self.min.y <= self.max.y
  }
}

impl Default for Aabb2 {
  fn default() -> Self {
    Self::empty()
  }
}

/// Axis-aligned bounding box of an output mesh.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Render vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
  pub position: [f32; 3],

  /// Unit surface normal.
  pub normal: [f32; 3],

  /// Tangent along U, handedness in `w`.
  pub tangent: [f32; 4],

  pub uv: [f32; 2],
}

impl Default for Vertex {
  fn default() -> Self {
    Self {
      position: [0.0; 3],
      normal: [0.0, 0.0, -1.0],
      tangent: [1.0, 0.0, 0.0, 1.0],
      uv: [0.0; 2],
    }
  }
}

/// Physics-only vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CollisionVertex {
  pub position: [f32; 3],
}

/// Vertex types that expose a position for bounds and clipping.
pub trait HasPosition {
  fn position(&self) -> Vec3;
}

impl HasPosition for Vertex {
  #[inline]
  fn position(&self) -> Vec3 {
    Vec3::from_array(self.position)
  }
}

impl HasPosition for CollisionVertex {
  #[inline]
  fn position(&self) -> Vec3 {
    Vec3::from_array(self.position)
  }
}

/// Triangle list mesh.
#[derive(Clone, Debug)]
pub struct MeshOutput<V = Vertex> {
  pub vertices: Vec<V>,

  /// Triangle indices (3 per triangle).
  pub indices: Vec<u32>,

  pub bounds: MinMaxAABB,
}

impl<V> Default for MeshOutput<V> {
  fn default() -> Self {
    Self {
      vertices: Vec::new(),
      indices: Vec::new(),
      bounds: MinMaxAABB::empty(),
    }
  }
}

impl<V> MeshOutput<V> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear all buffers, preserving capacity.
  pub fn clear(&mut self) {
    self.vertices.clear();
    self.indices.clear();
    self.bounds = MinMaxAABB::empty();
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Append another mesh, offsetting its indices.
  pub fn append(&mut self, other: &MeshOutput<V>)
  where
    V: Copy,
  {
    let base = self.vertices.len() as u32;
    self.vertices.extend_from_slice(&other.vertices);
    self.indices.extend(other.indices.iter().map(|i| i + base));
    if other.bounds.is_valid() {
      self.bounds.encapsulate(other.bounds.min);
      self.bounds.encapsulate(other.bounds.max);
    }
  }
}

impl<V: HasPosition> MeshOutput<V> {
  /// Recompute bounds from the vertex positions.
  pub fn recompute_bounds(&mut self) {
    self.bounds = MinMaxAABB::empty();
    for vertex in &self.vertices {
      self.bounds.encapsulate(vertex.position().to_array());
    }
  }
}

impl<V: Pod> MeshOutput<V> {
  /// Vertex data as raw bytes for upload.
  pub fn vertex_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.vertices)
  }

  /// Index data as raw bytes for upload.
  pub fn index_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.indices)
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
