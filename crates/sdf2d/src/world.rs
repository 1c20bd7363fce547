//! World: layers of chunk grids, shape application and rebuild scheduling.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ add / subtract (any thread that owns &mut World)                        │
//! │   shape bounds ─► chunk_range ─► create chunks (add only)               │
//! │                              └─► sample chunks in parallel (rayon)      │
//! │                              └─► drop chunks left empty                 │
//! │                              └─► append to layer history                │
//! │                                                                         │
//! │ tick (owning thread)                                                    │
//! │   finished rebuilds ─► current job? upload meshes : discard             │
//! │   dirty chunks ─► upload texture ─► schedule rebuild (one in flight)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shapes live in layer space. `WorldConfig::scale` only scales the meshes
//! handed to the host.

use std::thread::{self, ThreadId};
use std::time::Duration;

use glam::{IVec2, Vec3};
use rayon::prelude::*;
use web_time::Instant;

use crate::chunk::{Chunk, ChunkCoord, ChunkGrid, ChunkKey, ChunkRange, ChunkStore};
use crate::error::{ShapeError, WorldError};
use crate::layer::{LayerConfig, LayerId};
use crate::mesher::{MeshJob, MeshSettings};
use crate::metrics::WorldMetrics;
use crate::quality::Quality;
use crate::rebuild::{RebuildQueue, RebuildResult};
use crate::resources::{CpuResources, ResourceFactory};
use crate::sample_array::{Modification, Op};
use crate::shapes::{DistanceField, ShapeReader, ShapeRef, ShapeRegistry, ShapeWriter};
use crate::types::Aabb2;

/// World-wide settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
  /// Host supports physics; layers with collision get collision meshes.
  pub physics_enabled: bool,

  /// Layer space to host space, per axis.
  pub scale: Vec3,
}

impl Default for WorldConfig {
  fn default() -> Self {
    Self {
      physics_enabled: true,
      scale: Vec3::ONE,
    }
  }
}

impl WorldConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_physics(mut self, enabled: bool) -> Self {
    self.physics_enabled = enabled;
    self
  }

  pub fn with_scale(mut self, scale: Vec3) -> Self {
    self.scale = scale;
    self
  }
}

/// What one [`World::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
  /// Finished rebuilds uploaded.
  pub applied: usize,
  /// Finished rebuilds dropped as stale.
  pub discarded: usize,
  /// Applied rebuilds that failed and produced empty meshes.
  pub failed: usize,
  pub scheduled: usize,
  /// Dirty chunks with nothing to mesh.
  pub skipped: usize,
  pub textures_uploaded: usize,
}

/// Does chunk `c`, grown by `margin`, overlap `[lo, hi]` on one axis?
#[inline]
fn axis_overlaps(c: i32, size: f32, margin: f32, lo: f32, hi: f32) -> bool {
  let center = c as f32 * size;
  let reach = size * 0.5 + margin;
  center - reach <= hi && center + reach >= lo
}

/// Chunk coordinates are clamped to `±2^29` so range bounds and their
/// differences stay inside `i32`.
const MAX_CHUNK_COORD: f32 = (1 << 29) as f32;

/// Half-open chunk interval whose members satisfy [`axis_overlaps`].
fn axis_range(size: f32, margin: f32, lo: f32, hi: f32) -> (i32, i32) {
  let chunk = |world: f32| (world / size).clamp(-MAX_CHUNK_COORD, MAX_CHUNK_COORD);
  let first = chunk(lo - size * 0.5 - margin).floor() as i32 - 1;
  let last = chunk(hi + size * 0.5 + margin).ceil() as i32 + 1;

  let mut min = first;
  while min <= last && !axis_overlaps(min, size, margin, lo, hi) {
    min += 1;
  }
  let mut max = last;
  while max >= min && !axis_overlaps(max, size, margin, lo, hi) {
    max -= 1;
  }
  (min, max + 1)
}

fn usable_bounds(bounds: &Aabb2) -> bool {
  bounds.is_valid() && bounds.min.is_finite() && bounds.max.is_finite()
}

/// Chunks a shape with `bounds` can influence: every chunk whose square,
/// grown by `max_distance + unit`, overlaps `bounds`.
pub fn chunk_range(bounds: Aabb2, quality: &Quality) -> ChunkRange {
  if !usable_bounds(&bounds) {
    if bounds.is_valid() {
      tracing::warn!(?bounds, "shape bounds are not finite, no chunks affected");
    }
    return ChunkRange::empty();
  }
  let margin = quality.influence_margin();
  let size = quality.chunk_size;
  let (x0, x1) = axis_range(size, margin, bounds.min.x, bounds.max.x);
  let (y0, y1) = axis_range(size, margin, bounds.min.y, bounds.max.y);
  ChunkRange {
    min: IVec2::new(x0, y0),
    max: IVec2::new(x1, y1),
  }
}

/// Membership test matching [`chunk_range`] exactly.
pub fn chunk_intersects(coord: ChunkCoord, bounds: Aabb2, quality: &Quality) -> bool {
  if !usable_bounds(&bounds) {
    return false;
  }
  let margin = quality.influence_margin();
  let size = quality.chunk_size;
  axis_overlaps(coord.0.x, size, margin, bounds.min.x, bounds.max.x)
    && axis_overlaps(coord.0.y, size, margin, bounds.min.y, bounds.max.y)
}

struct Layer<R: ResourceFactory> {
  config: LayerConfig,
  /// Quality the current chunks were sampled with.
  quality: Quality,
  chunks: ChunkGrid<Chunk<R>>,
  history: Vec<Modification>,
}

/// Chunked 2D distance field world.
pub struct World<R: ResourceFactory = CpuResources> {
  config: WorldConfig,
  layers: Vec<Layer<R>>,
  factory: R,
  queue: RebuildQueue,
  metrics: WorldMetrics,
  owner: ThreadId,
}

impl World<CpuResources> {
  /// World uploading into in-memory resources.
  pub fn new(config: WorldConfig) -> Self {
    Self::with_resources(config, CpuResources)
  }
}

impl<R: ResourceFactory> World<R> {
  /// World uploading through `factory`. The calling thread becomes the
  /// owning thread for [`World::tick`].
  pub fn with_resources(config: WorldConfig, factory: R) -> Self {
    Self {
      config,
      layers: Vec::new(),
      factory,
      queue: RebuildQueue::default(),
      metrics: WorldMetrics::new(),
      owner: thread::current().id(),
    }
  }

  pub fn config(&self) -> &WorldConfig {
    &self.config
  }

  pub fn metrics(&self) -> &WorldMetrics {
    &self.metrics
  }

  pub fn factory(&self) -> &R {
    &self.factory
  }

  pub fn add_layer(&mut self, config: LayerConfig) -> LayerId {
    let id = LayerId(self.layers.len());
    self.layers.push(Layer {
      quality: config.quality,
      config,
      chunks: ChunkGrid::new(),
      history: Vec::new(),
    });
    id
  }

  pub fn layer_count(&self) -> usize {
    self.layers.len()
  }

  fn layer(&self, id: LayerId) -> Result<&Layer<R>, WorldError> {
    self.layers.get(id.0).ok_or(WorldError::UnknownLayer(id.0))
  }

  fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer<R>, WorldError> {
    self.layers.get_mut(id.0).ok_or(WorldError::UnknownLayer(id.0))
  }

  pub fn layer_config(&self, id: LayerId) -> Result<&LayerConfig, WorldError> {
    Ok(&self.layer(id)?.config)
  }

  /// Edit a layer's configuration. Quality changes take effect on
  /// [`World::rebuild_layer`], everything else on [`World::remesh_layer`].
  pub fn layer_config_mut(&mut self, id: LayerId) -> Result<&mut LayerConfig, WorldError> {
    Ok(&mut self.layer_mut(id)?.config)
  }

  /// Quality the layer's chunks are currently sampled with.
  pub fn layer_quality(&self, id: LayerId) -> Result<Quality, WorldError> {
    Ok(self.layer(id)?.quality)
  }

  /// Modifications applied to the layer, oldest first.
  pub fn history(&self, id: LayerId) -> Result<&[Modification], WorldError> {
    Ok(&self.layer(id)?.history)
  }

  pub fn chunks(&self, id: LayerId) -> Result<&ChunkGrid<Chunk<R>>, WorldError> {
    Ok(&self.layer(id)?.chunks)
  }

  pub fn chunk(&self, id: LayerId, coord: ChunkCoord) -> Option<&Chunk<R>> {
    self.layers.get(id.0)?.chunks.get(coord)
  }

  /// Chunks across all layers.
  pub fn chunk_count(&self) -> usize {
    self.layers.iter().map(|layer| layer.chunks.len()).sum()
  }

  /// Union `shape` into a layer. Returns the number of chunks that changed.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "world::add"))]
  pub fn add(&mut self, layer: LayerId, shape: ShapeRef) -> Result<usize, WorldError> {
    self.modify(layer, Modification::add(shape))
  }

  /// Subtract `shape` from a layer. Never creates chunks; chunks left empty
  /// are removed. Returns the number of chunks that changed.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "world::subtract"))]
  pub fn subtract(&mut self, layer: LayerId, shape: ShapeRef) -> Result<usize, WorldError> {
    self.modify(layer, Modification::subtract(shape))
  }

  fn modify(&mut self, id: LayerId, modification: Modification) -> Result<usize, WorldError> {
    let start = Instant::now();
    let changed = self.apply(id, modification.op, &modification.shape)?;
    self.layer_mut(id)?.history.push(modification);
    self
      .metrics
      .record_sample_timing(start.elapsed().as_micros() as u64);
    Ok(changed)
  }

  fn apply(&mut self, id: LayerId, op: Op, shape: &ShapeRef) -> Result<usize, WorldError> {
    let layer = self.layers.get_mut(id.0).ok_or(WorldError::UnknownLayer(id.0))?;
    let quality = layer.quality;
    let range = chunk_range(shape.bounds(), &quality);
    if range.is_empty() {
      return Ok(0);
    }

    if op == Op::Add {
      for coord in range.iter() {
        layer
          .chunks
          .get_or_insert_with(coord, || Chunk::new(coord, quality));
      }
    }

    let outcomes: Vec<(ChunkCoord, bool, bool)> = layer
      .chunks
      .par_iter_in(range)
      .map(|(coord, chunk)| {
        let changed = match op {
          Op::Add => chunk.add(shape),
          Op::Subtract => chunk.subtract(shape),
        };
        // Add can only leave a fresh, untouched chunk empty.
        let empty = match op {
          Op::Add => !changed && chunk.samples().is_empty(),
          Op::Subtract => changed && chunk.samples().is_empty(),
        };
        (*coord, changed, empty)
      })
      .collect();

    let mut changed = 0;
    for (coord, chunk_changed, empty) in outcomes {
      changed += chunk_changed as usize;
      if empty {
        layer.chunks.remove(coord);
        tracing::debug!(layer = id.0, ?coord, "removed empty chunk");
      }
    }
    self.metrics.set_live_chunks(self.chunk_count());
    Ok(changed)
  }

  /// Apply finished rebuilds, upload textures and schedule new rebuilds.
  ///
  /// # Panics
  /// Debug builds assert that this runs on the thread that created the
  /// world.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "world::tick"))]
  pub fn tick(&mut self) -> TickStats {
    debug_assert_eq!(
      thread::current().id(),
      self.owner,
      "World::tick must run on the thread that created the world"
    );

    let mut stats = TickStats::default();
    while let Some(result) = self.queue.try_recv() {
      self.apply_result(result, &mut stats);
    }
    self.schedule_dirty(&mut stats);
    stats
  }

  fn apply_result(&mut self, result: RebuildResult, stats: &mut TickStats) {
    let RebuildResult {
      key,
      job,
      meshes,
      mesh_time_us,
    } = result;
    self.metrics.record_mesh_timing(mesh_time_us);

    let current = self
      .layers
      .get_mut(key.layer.0)
      .and_then(|layer| layer.chunks.get_mut(key.coord))
      .filter(|chunk| chunk.in_flight() == Some(job));
    let Some(chunk) = current else {
      tracing::debug!(?key, job = job.raw(), "discarding stale rebuild");
      self.metrics.record_discard();
      stats.discarded += 1;
      return;
    };
    chunk.finish_rebuild(job);

    if meshes.failed {
      self.metrics.record_failure();
      stats.failed += 1;
    }
    for kind in chunk.upload_meshes(&meshes, &mut self.factory) {
      self.metrics.record_upload(kind);
    }
    stats.applied += 1;
  }

  fn schedule_dirty(&mut self, stats: &mut TickStats) {
    let physics = self.config.physics_enabled;
    let scale = self.config.scale;

    for (index, layer) in self.layers.iter_mut().enumerate() {
      for (coord, chunk) in layer.chunks.iter_mut() {
        if chunk.is_texture_dirty() {
          let kind = chunk.upload_texture(&mut self.factory);
          self.metrics.record_upload(kind);
          stats.textures_uploaded += 1;
        }
        if !chunk.is_dirty() || chunk.in_flight().is_some() {
          continue;
        }

        let settings =
          MeshSettings::new(&layer.config, *chunk.quality(), chunk.origin(), physics).with_scale(scale);
        if settings.is_noop() {
          chunk.skip_rebuild();
          stats.skipped += 1;
          continue;
        }

        let key = ChunkKey {
          layer: LayerId(index),
          coord: *coord,
        };
        let job = self.queue.schedule(
          key,
          MeshJob {
            samples: chunk.samples().snapshot(),
            settings,
          },
        );
        chunk.begin_rebuild(job);
        stats.scheduled += 1;
      }
    }
  }

  /// No rebuild in flight and no chunk waiting for one.
  pub fn is_idle(&self) -> bool {
    self.queue.is_idle()
      && self.layers.iter().all(|layer| {
        layer
          .chunks
          .iter()
          .all(|(_, chunk)| !chunk.is_dirty() && !chunk.is_texture_dirty())
      })
  }

  /// Tick until idle or until `timeout` passes. Returns whether the world
  /// went idle.
  pub fn flush(&mut self, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
      self.tick();
      if self.is_idle() {
        return true;
      }
      let now = Instant::now();
      if now >= deadline {
        return false;
      }
      if let Some(result) = self.queue.recv_timeout(deadline - now) {
        let mut stats = TickStats::default();
        self.apply_result(result, &mut stats);
      }
    }
  }

  /// Resample a layer from its history.
  ///
  /// With a changed quality every chunk is recreated at the new quality;
  /// otherwise chunks are resampled in place. Returns the number of chunks
  /// whose samples changed.
  pub fn rebuild_layer(&mut self, id: LayerId) -> Result<usize, WorldError> {
    let layer = self.layer_mut(id)?;

    if layer.config.quality != layer.quality {
      layer.quality = layer.config.quality;
      layer.chunks.clear();
      let history = std::mem::take(&mut layer.history);
      let replayed = history
        .iter()
        .try_for_each(|m| self.apply(id, m.op, &m.shape).map(|_| ()));
      let layer = self.layer_mut(id)?;
      layer.history = history;
      replayed?;
      let count = layer.chunks.len();
      tracing::debug!(layer = id.0, chunks = count, "layer resampled at new quality");
      return Ok(count);
    }

    let Layer {
      chunks, history, ..
    } = layer;
    let history: &[Modification] = history;
    let changed: usize = chunks
      .par_iter_mut()
      .map(|(_, chunk)| chunk.replay(history) as usize)
      .sum();
    chunks.retain(|_, chunk| !chunk.samples().is_empty());
    self.metrics.set_live_chunks(self.chunk_count());
    Ok(changed)
  }

  /// Mark every chunk of a layer for a new mesh (material or edge changes).
  pub fn remesh_layer(&mut self, id: LayerId) -> Result<(), WorldError> {
    for (_, chunk) in self.layer_mut(id)?.chunks.iter_mut() {
      chunk.mark_dirty();
    }
    Ok(())
  }

  /// Drop every chunk and the history of a layer.
  pub fn clear_layer(&mut self, id: LayerId) -> Result<(), WorldError> {
    let layer = self.layer_mut(id)?;
    layer.chunks.clear();
    layer.history.clear();
    self.metrics.set_live_chunks(self.chunk_count());
    Ok(())
  }

  /// Serialize a layer's history: `u32` count, then per modification an op
  /// byte and the shape.
  pub fn save_history(&self, id: LayerId, registry: &ShapeRegistry) -> Result<Vec<u8>, WorldError> {
    let layer = self.layer(id)?;
    let mut writer = ShapeWriter::new();
    writer.write_u32(layer.history.len() as u32);
    for modification in &layer.history {
      writer.write_u8(modification.op.to_byte());
      registry.write_shape(modification.shape.as_ref(), &mut writer)?;
    }
    Ok(writer.into_bytes())
  }

  /// Replace a layer's contents with a saved history. Nothing changes if
  /// the data does not parse. Returns the number of modifications replayed.
  pub fn load_history(
    &mut self,
    id: LayerId,
    bytes: &[u8],
    registry: &ShapeRegistry,
  ) -> Result<usize, WorldError> {
    self.layer(id)?;

    let mut reader = ShapeReader::new(bytes);
    let count = reader.read_u32()? as usize;
    let mut history = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
      let byte = reader.read_u8()?;
      let op = Op::from_byte(byte)
        .ok_or_else(|| ShapeError::InvalidData(format!("unknown modification op {byte}")))?;
      let shape = registry.read_shape(&mut reader)?;
      history.push(Modification { op, shape });
    }
    if !reader.is_at_end() {
      return Err(
        ShapeError::InvalidData(format!("{} trailing bytes after history", reader.remaining())).into(),
      );
    }

    self.clear_layer(id)?;
    for modification in history {
      self.modify(id, modification)?;
    }
    Ok(count)
  }
}

#[cfg(test)]
#[path = "world_test.rs"]
mod world_test;
