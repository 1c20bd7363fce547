//! Chunk mesher: sample snapshot to render and collision meshes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ MeshJob { samples (front snapshot), settings }                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   ContourTracer::trace ──► Contours (all loops of the chunk)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   Triangulator::triangulate ──► cap fill (shared by every pass)         │
//! │           │                                                             │
//! │           ├─► render pass: extrude(layer edge style)                    │
//! │           │     front / back / cut ──► clip ──► world space             │
//! │           │     (one stream when all materials match)                   │
//! │           │                                                             │
//! │           └─► collision pass: extrude(Sharp) ──► positions ──► clip     │
//! │                                                                         │
//! │ Any MeshError or panic: logged with the loop dump, empty ChunkMeshes.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is built in chunk-local space and clipped to the chunk square
//! `[-size/2, size/2]²`, then offset by the chunk origin and scaled per axis.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::contour::{ContourTracer, Contours};
use crate::error::MeshError;
use crate::layer::{EdgeStyle, LayerConfig};
use crate::polygon::{clip_to_rect, extrude, ExtrudeParams, Profile, Triangulator};
use crate::pool::Reset;
use crate::quality::Quality;
use crate::types::{Aabb2, CollisionVertex, MaterialId, MeshOutput, Vertex};

/// Everything a mesh rebuild needs besides the samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshSettings {
  /// Quality the samples were taken with.
  pub quality: Quality,

  pub depth: f32,
  pub z_offset: f32,
  pub edge_style: EdgeStyle,
  pub max_smoothing_angle: f32,
  pub uv_scale: f32,

  pub front_material: Option<MaterialId>,
  pub back_material: Option<MaterialId>,
  pub cut_material: Option<MaterialId>,

  /// Build the collision mesh.
  pub collision: bool,

  /// World position of the chunk center.
  pub origin: Vec2,

  /// World scale per axis.
  pub scale: Vec3,
}

impl MeshSettings {
  /// Settings for a chunk of `layer` sampled with `quality`, centered at
  /// `origin`.
  pub fn new(layer: &LayerConfig, quality: Quality, origin: Vec2, physics_enabled: bool) -> Self {
    Self {
      quality,
      depth: layer.depth,
      z_offset: layer.z_offset,
      edge_style: layer.edge_style,
      max_smoothing_angle: layer.max_smoothing_angle,
      uv_scale: layer.uv_scale,
      front_material: layer.front_material,
      back_material: layer.back_material,
      cut_material: layer.cut_material,
      collision: layer.collision && physics_enabled,
      origin,
      scale: Vec3::ONE,
    }
  }

  pub fn with_scale(mut self, scale: Vec3) -> Self {
    self.scale = scale;
    self
  }

  /// True if at least one render stream has a material.
  pub fn renders(&self) -> bool {
    self.front_material.is_some() || self.back_material.is_some() || self.cut_material.is_some()
  }

  /// True if all three streams share one material.
  pub fn single_material(&self) -> bool {
    self.front_material.is_some()
      && self.front_material == self.back_material
      && self.front_material == self.cut_material
  }

  /// Nothing to build: the rebuild can be skipped entirely.
  pub fn is_noop(&self) -> bool {
    !self.renders() && !self.collision
  }

  fn extrude_params(&self, edge_style: EdgeStyle) -> ExtrudeParams {
    ExtrudeParams {
      half_depth: self.depth * 0.5,
      z_offset: self.z_offset,
      edge_style,
      max_smoothing_angle: self.max_smoothing_angle,
      uv_scale: self.uv_scale,
      uv_origin: self.origin,
    }
  }
}

/// One mesh rebuild request.
#[derive(Clone, Debug)]
pub struct MeshJob {
  /// Front buffer snapshot, row-major.
  pub samples: Arc<Vec<u8>>,
  pub settings: MeshSettings,
}

/// Mesh streams of one chunk, in world space.
#[derive(Clone, Debug, Default)]
pub struct ChunkMeshes {
  /// Front cap, or everything when all materials match.
  pub front: MeshOutput,
  pub back: MeshOutput,
  /// Wall band between the caps.
  pub cut: MeshOutput,
  pub collision: MeshOutput<CollisionVertex>,
  /// The build failed and the streams were left empty.
  pub failed: bool,
}

impl ChunkMeshes {
  pub fn is_empty(&self) -> bool {
    self.front.is_empty() && self.back.is_empty() && self.cut.is_empty() && self.collision.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.front.triangle_count() + self.back.triangle_count() + self.cut.triangle_count()
  }
}

/// Working buffers reused across rebuilds.
#[derive(Debug, Default)]
pub struct MesherScratch {
  tracer: ContourTracer,
  contours: Contours,
  triangulator: Triangulator,
  fill: Vec<u32>,
  front: MeshOutput,
  back: MeshOutput,
  cut: MeshOutput,
  collision: MeshOutput<CollisionVertex>,
}

impl MesherScratch {
  /// Loops traced by the last rebuild.
  pub fn contours(&self) -> &Contours {
    &self.contours
  }
}

impl Reset for MesherScratch {
  fn reset(&mut self) {
    self.tracer.reset();
    self.contours.reset();
    self.triangulator.reset();
    self.fill.clear();
    self.front.clear();
    self.back.clear();
    self.cut.clear();
    self.collision.clear();
  }
}

/// Turns sample snapshots into chunk meshes.
pub trait Mesher: Send + Sync {
  type Scratch: Reset + Default + Send;

  /// Never fails: errors are contained and yield empty meshes with
  /// [`ChunkMeshes::failed`] set.
  fn mesh(&self, job: &MeshJob, scratch: &mut Self::Scratch) -> ChunkMeshes;
}

/// Marching squares + polygon extrusion.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContourMesher;

impl Mesher for ContourMesher {
  type Scratch = MesherScratch;

  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "mesher::mesh"))]
  fn mesh(&self, job: &MeshJob, scratch: &mut MesherScratch) -> ChunkMeshes {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| build(job, scratch)));
    let reason = match outcome {
      Ok(Ok(meshes)) => return meshes,
      Ok(Err(error)) => error.to_string(),
      Err(payload) => panic_message(payload.as_ref()),
    };

    tracing::error!(
      %reason,
      quality = ?job.settings.quality,
      origin = ?job.settings.origin,
      loops = %scratch.contours.dump(),
      "chunk mesh build failed, using empty meshes"
    );
    scratch.reset();
    ChunkMeshes {
      failed: true,
      ..Default::default()
    }
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    format!("panic: {message}")
  } else if let Some(message) = payload.downcast_ref::<String>() {
    format!("panic: {message}")
  } else {
    "panic".to_string()
  }
}

fn build(job: &MeshJob, scratch: &mut MesherScratch) -> Result<ChunkMeshes, MeshError> {
  let settings = &job.settings;
  let quality = &settings.quality;
  let mut meshes = ChunkMeshes::default();

  scratch
    .tracer
    .trace(&job.samples, quality, &mut scratch.contours);
  if scratch.contours.is_empty() || settings.is_noop() {
    return Ok(meshes);
  }

  scratch.fill.clear();
  scratch
    .triangulator
    .triangulate(&scratch.contours, &mut scratch.fill)?;

  let half = quality.chunk_size * 0.5;
  let clip_rect = Aabb2::from_center_half_extents(Vec2::ZERO, Vec2::splat(half));

  if settings.renders() {
    extrude_into(scratch, settings.extrude_params(settings.edge_style));

    if settings.single_material() {
      for stream in [&scratch.front, &scratch.back, &scratch.cut] {
        clip_to_rect(stream, clip_rect, &mut meshes.front);
      }
    } else {
      if settings.front_material.is_some() {
        clip_to_rect(&scratch.front, clip_rect, &mut meshes.front);
      }
      if settings.back_material.is_some() {
        clip_to_rect(&scratch.back, clip_rect, &mut meshes.back);
      }
      if settings.cut_material.is_some() {
        clip_to_rect(&scratch.cut, clip_rect, &mut meshes.cut);
      }
    }

    for mesh in [&mut meshes.front, &mut meshes.back, &mut meshes.cut] {
      place_render(mesh, settings.origin, settings.scale);
    }
  }

  if settings.collision {
    extrude_into(scratch, settings.extrude_params(EdgeStyle::Sharp));

    scratch.collision.clear();
    for stream in [&scratch.front, &scratch.back, &scratch.cut] {
      let base = scratch.collision.vertices.len() as u32;
      scratch
        .collision
        .vertices
        .extend(stream.vertices.iter().map(|v| CollisionVertex {
          position: v.position,
        }));
      scratch
        .collision
        .indices
        .extend(stream.indices.iter().map(|i| i + base));
    }
    clip_to_rect(&scratch.collision, clip_rect, &mut meshes.collision);
    place_collision(&mut meshes.collision, settings.origin, settings.scale);
  }

  Ok(meshes)
}

fn extrude_into(scratch: &mut MesherScratch, params: ExtrudeParams) {
  let profile = Profile::new(params.edge_style, params.half_depth);
  scratch.front.clear();
  scratch.back.clear();
  scratch.cut.clear();
  extrude(
    &scratch.contours,
    &scratch.fill,
    &profile,
    &params,
    &mut scratch.front,
    &mut scratch.back,
    &mut scratch.cut,
  );
}

#[inline]
fn place_point(position: [f32; 3], origin: Vec2, scale: Vec3) -> [f32; 3] {
  [
    (origin.x + position[0]) * scale.x,
    (origin.y + position[1]) * scale.y,
    position[2] * scale.z,
  ]
}

/// Chunk-local to world space. Normals use the inverse scale.
fn place_render(mesh: &mut MeshOutput<Vertex>, origin: Vec2, scale: Vec3) {
  let uniform = scale == Vec3::ONE;
  for vertex in &mut mesh.vertices {
    vertex.position = place_point(vertex.position, origin, scale);
    if !uniform {
      let normal = Vec3::from_array(vertex.normal);
      vertex.normal = (normal / scale).normalize_or(normal).to_array();
      let tangent = Vec3::from_slice(&vertex.tangent[..3]);
      let tangent = (tangent * scale).normalize_or(tangent);
      vertex.tangent = [tangent.x, tangent.y, tangent.z, vertex.tangent[3]];
    }
  }
  mesh.recompute_bounds();
}

fn place_collision(mesh: &mut MeshOutput<CollisionVertex>, origin: Vec2, scale: Vec3) {
  for vertex in &mut mesh.vertices {
    vertex.position = place_point(vertex.position, origin, scale);
  }
  mesh.recompute_bounds();
}

#[cfg(test)]
#[path = "mesher_test.rs"]
mod mesher_test;
