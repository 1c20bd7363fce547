//! Chunks: one sample array per (layer, chunk coordinate), plus its uploaded
//! resources and rebuild state.
//!
//! ```text
//!   chunk (cx, cy) covers world [c*s - s/2, c*s + s/2] per axis
//!
//!   world shape ──Translate(-c*s)──► local shape ──► SampleArray
//!                                                     │ changed?
//!                                                     ▼
//!                                          dirty + texture_dirty
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use glam::{IVec2, Vec2};
use rayon::prelude::*;

use crate::layer::LayerId;
use crate::mesher::ChunkMeshes;
use crate::quality::Quality;
use crate::rebuild::JobId;
use crate::resources::{upload_mesh_slot, upload_texture, ResourceFactory, UploadKind};
use crate::sample_array::{Modification, SampleArray};
use crate::shapes::{ShapeRef, Translate};
use crate::types::Aabb2;

/// Integer chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ChunkCoord(pub IVec2);

impl Ord for ChunkCoord {
  /// Row-major: `y` first, then `x`.
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    (self.0.y, self.0.x).cmp(&(other.0.y, other.0.x))
  }
}

impl PartialOrd for ChunkCoord {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl ChunkCoord {
  pub const fn new(x: i32, y: i32) -> Self {
    Self(IVec2::new(x, y))
  }

  /// World position of the chunk center.
  #[inline]
  pub fn origin(&self, chunk_size: f32) -> Vec2 {
    self.0.as_vec2() * chunk_size
  }

  /// World rectangle covered by the chunk.
  pub fn bounds(&self, chunk_size: f32) -> Aabb2 {
    Aabb2::from_center_half_extents(self.origin(chunk_size), Vec2::splat(chunk_size * 0.5))
  }
}

/// Chunk identity across layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
  pub layer: LayerId,
  pub coord: ChunkCoord,
}

/// Half-open rectangle of chunk coordinates `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRange {
  pub min: IVec2,
  pub max: IVec2,
}

impl ChunkRange {
  pub fn empty() -> Self {
    Self {
      min: IVec2::ZERO,
      max: IVec2::ZERO,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.max.x <= self.min.x || self.max.y <= self.min.y
  }

  pub fn len(&self) -> usize {
    if self.is_empty() {
      return 0;
    }
    let size = self.max - self.min;
    size.x as usize * size.y as usize
  }

  #[inline]
  pub fn contains(&self, coord: ChunkCoord) -> bool {
    coord.0.cmpge(self.min).all() && coord.0.cmplt(self.max).all()
  }

  /// Row by row, `x` fastest.
  pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> {
    let (min, max) = (self.min, self.max);
    (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| ChunkCoord::new(x, y)))
  }
}

/// Resources a chunk has uploaded to. Slots stay empty until first needed.
pub struct ChunkResources<R: ResourceFactory> {
  pub front: Option<R::Mesh>,
  pub back: Option<R::Mesh>,
  pub cut: Option<R::Mesh>,
  pub collision: Option<R::CollisionMesh>,
  pub texture: Option<R::Texture>,
}

impl<R: ResourceFactory> Default for ChunkResources<R> {
  fn default() -> Self {
    Self {
      front: None,
      back: None,
      cut: None,
      collision: None,
      texture: None,
    }
  }
}

/// One chunk of one layer.
pub struct Chunk<R: ResourceFactory> {
  coord: ChunkCoord,
  samples: SampleArray,
  dirty: bool,
  texture_dirty: bool,
  in_flight: Option<JobId>,
  resources: ChunkResources<R>,
}

impl<R: ResourceFactory> Chunk<R> {
  pub fn new(coord: ChunkCoord, quality: Quality) -> Self {
    Self {
      coord,
      samples: SampleArray::new(quality),
      dirty: false,
      texture_dirty: false,
      in_flight: None,
      resources: ChunkResources::default(),
    }
  }

  pub fn coord(&self) -> ChunkCoord {
    self.coord
  }

  pub fn samples(&self) -> &SampleArray {
    &self.samples
  }

  pub fn quality(&self) -> &Quality {
    self.samples.quality()
  }

  /// World position of the chunk center.
  pub fn origin(&self) -> Vec2 {
    self.coord.origin(self.quality().chunk_size)
  }

  pub fn resources(&self) -> &ChunkResources<R> {
    &self.resources
  }

  /// Needs a mesh rebuild.
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Needs a texture upload.
  pub fn is_texture_dirty(&self) -> bool {
    self.texture_dirty
  }

  pub fn in_flight(&self) -> Option<JobId> {
    self.in_flight
  }

  pub fn mark_dirty(&mut self) {
    self.dirty = true;
    self.texture_dirty = true;
  }

  /// Union a world-space shape into this chunk.
  pub fn add(&mut self, shape: &ShapeRef) -> bool {
    let local = Translate::new(Arc::clone(shape), -self.origin());
    let changed = self.samples.add(&local);
    if changed {
      self.mark_dirty();
    }
    changed
  }

  /// Subtract a world-space shape from this chunk.
  pub fn subtract(&mut self, shape: &ShapeRef) -> bool {
    let local = Translate::new(Arc::clone(shape), -self.origin());
    let changed = self.samples.subtract(&local);
    if changed {
      self.mark_dirty();
    }
    changed
  }

  /// Resample from scratch by replaying world-space `history`.
  pub fn replay(&mut self, history: &[Modification]) -> bool {
    let offset = -self.origin();
    let local: Vec<Modification> = history
      .iter()
      .map(|modification| Modification {
        op: modification.op,
        shape: Arc::new(Translate::new(Arc::clone(&modification.shape), offset)),
      })
      .collect();
    let changed = self.samples.rebuild(&local);
    if changed {
      self.mark_dirty();
    }
    changed
  }

  pub(crate) fn begin_rebuild(&mut self, job: JobId) {
    self.in_flight = Some(job);
    self.dirty = false;
  }

  /// Drop the dirty flag without meshing (nothing to build).
  pub(crate) fn skip_rebuild(&mut self) {
    self.dirty = false;
  }

  /// Take ownership of a finished rebuild if it is the one in flight.
  pub(crate) fn finish_rebuild(&mut self, job: JobId) -> bool {
    if self.in_flight != Some(job) {
      return false;
    }
    self.in_flight = None;
    true
  }

  /// Upload the front samples to the chunk texture.
  pub(crate) fn upload_texture(&mut self, factory: &mut R) -> UploadKind {
    self.texture_dirty = false;
    let side = self.samples.side();
    upload_texture(
      &mut self.resources.texture,
      side,
      self.samples.front(),
      |side| factory.create_texture(side),
    )
  }

  /// Upload finished meshes. Returns one entry per stream written.
  pub(crate) fn upload_meshes(&mut self, meshes: &ChunkMeshes, factory: &mut R) -> Vec<UploadKind> {
    let resources = &mut self.resources;
    [
      upload_mesh_slot(&mut resources.front, &meshes.front, || factory.create_mesh()),
      upload_mesh_slot(&mut resources.back, &meshes.back, || factory.create_mesh()),
      upload_mesh_slot(&mut resources.cut, &meshes.cut, || factory.create_mesh()),
      upload_mesh_slot(&mut resources.collision, &meshes.collision, || {
        factory.create_collision_mesh()
      }),
    ]
    .into_iter()
    .flatten()
    .collect()
  }
}

/// Keyed chunk storage.
pub trait ChunkStore<C> {
  fn get(&self, coord: ChunkCoord) -> Option<&C>;
  fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut C>;
  fn get_or_insert_with(&mut self, coord: ChunkCoord, create: impl FnOnce() -> C) -> &mut C;
  fn remove(&mut self, coord: ChunkCoord) -> Option<C>;
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn contains(&self, coord: ChunkCoord) -> bool {
    self.get(coord).is_some()
  }
}

/// Hash map of chunks by coordinate.
pub struct ChunkGrid<C> {
  chunks: HashMap<ChunkCoord, C>,
}

impl<C> Default for ChunkGrid<C> {
  fn default() -> Self {
    Self {
      chunks: HashMap::new(),
    }
  }
}

impl<C> ChunkGrid<C> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &C)> {
    self.chunks.iter()
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ChunkCoord, &mut C)> {
    self.chunks.iter_mut()
  }

  /// Coordinates in ascending order.
  pub fn coords(&self) -> Vec<ChunkCoord> {
    let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
    coords.sort();
    coords
  }

  pub fn clear(&mut self) {
    self.chunks.clear();
  }

  /// Keep only chunks for which `keep` returns true.
  pub fn retain(&mut self, mut keep: impl FnMut(&ChunkCoord, &mut C) -> bool) {
    self.chunks.retain(|coord, chunk| keep(coord, chunk));
  }
}

impl<C: Send> ChunkGrid<C> {
  /// Parallel iterator over the chunks inside `range`.
  pub fn par_iter_in(
    &mut self,
    range: ChunkRange,
  ) -> impl ParallelIterator<Item = (&ChunkCoord, &mut C)> {
    self
      .chunks
      .par_iter_mut()
      .filter(move |(coord, _)| range.contains(**coord))
  }

  pub fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = (&ChunkCoord, &mut C)> {
    self.chunks.par_iter_mut()
  }
}

impl<C> ChunkStore<C> for ChunkGrid<C> {
  fn get(&self, coord: ChunkCoord) -> Option<&C> {
    self.chunks.get(&coord)
  }

  fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut C> {
    self.chunks.get_mut(&coord)
  }

  fn get_or_insert_with(&mut self, coord: ChunkCoord, create: impl FnOnce() -> C) -> &mut C {
    self.chunks.entry(coord).or_insert_with(create)
  }

  fn remove(&mut self, coord: ChunkCoord) -> Option<C> {
    self.chunks.remove(&coord)
  }

  fn len(&self) -> usize {
    self.chunks.len()
  }
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;
