//! Upload contracts between chunks and the host's render/physics resources.
//!
//! The core never touches GPU or physics objects. A host supplies a
//! [`ResourceFactory`] whose resources receive finished meshes and sample
//! textures on the thread that owns the world. [`CpuResources`] keeps
//! everything in plain vectors and is what the world uses by default.
//!
//! ```text
//!   upload_mesh(resource, mesh)
//!     fits current capacity? ── yes ─► write in place
//!                            └─ no  ─► reallocate (next power of two), write
//!
//!   upload_texture(slot, side, samples)
//!     same side? ── yes ─► rewrite the existing texture
//!                └─ no  ─► create a new one, write
//! ```

use bytemuck::Pod;

use crate::types::{CollisionVertex, MeshOutput, MinMaxAABB, Vertex};

/// Host-side mesh buffer.
pub trait MeshResource<V: Pod>: Send {
  fn vertex_capacity(&self) -> usize;
  fn index_capacity(&self) -> usize;

  /// Grow (or shrink) the buffers. Contents become undefined.
  fn reallocate(&mut self, vertex_capacity: usize, index_capacity: usize);

  /// Replace the contents. Callers guarantee the data fits the capacity.
  fn write(&mut self, vertices: &[V], indices: &[u32], bounds: MinMaxAABB);
}

/// Host-side single-channel `side x side` texture of quantized samples.
pub trait TextureResource: Send {
  fn side(&self) -> usize;

  /// Replace all texels, row-major.
  fn write(&mut self, samples: &[u8]);
}

/// Creates resources for new chunks.
pub trait ResourceFactory: Send {
  type Mesh: MeshResource<Vertex>;
  type CollisionMesh: MeshResource<CollisionVertex>;
  type Texture: TextureResource;

  fn create_mesh(&mut self) -> Self::Mesh;
  fn create_collision_mesh(&mut self) -> Self::CollisionMesh;
  fn create_texture(&mut self, side: usize) -> Self::Texture;
}

/// How an upload reached its resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
  InPlace,
  Reallocated,
}

/// Write `mesh` into `resource`, reallocating only if it does not fit.
pub fn upload_mesh<V: Pod, M: MeshResource<V> + ?Sized>(
  resource: &mut M,
  mesh: &MeshOutput<V>,
) -> UploadKind {
  let vertices = mesh.vertices.len();
  let indices = mesh.indices.len();
  let kind = if vertices <= resource.vertex_capacity() && indices <= resource.index_capacity() {
    UploadKind::InPlace
  } else {
    resource.reallocate(vertices.next_power_of_two(), indices.next_power_of_two());
    UploadKind::Reallocated
  };
  resource.write(&mesh.vertices, &mesh.indices, mesh.bounds);
  kind
}

/// [`upload_mesh`] into an optional resource. An empty slot stays empty for
/// an empty mesh; otherwise the resource is created on first use.
pub fn upload_mesh_slot<V: Pod, M: MeshResource<V>>(
  slot: &mut Option<M>,
  mesh: &MeshOutput<V>,
  create: impl FnOnce() -> M,
) -> Option<UploadKind> {
  if slot.is_none() && mesh.is_empty() {
    return None;
  }
  let resource = slot.get_or_insert_with(create);
  Some(upload_mesh(resource, mesh))
}

/// Write `samples` into the texture in `slot`, creating one when the slot
/// is empty or holds a texture of a different size.
pub fn upload_texture<T: TextureResource>(
  slot: &mut Option<T>,
  side: usize,
  samples: &[u8],
  create: impl FnOnce(usize) -> T,
) -> UploadKind {
  match slot {
    Some(texture) if texture.side() == side => {
      texture.write(samples);
      UploadKind::InPlace
    }
    _ => {
      let mut texture = create(side);
      texture.write(samples);
      *slot = Some(texture);
      UploadKind::Reallocated
    }
  }
}

/// Mesh kept in memory.
#[derive(Clone, Debug)]
pub struct CpuMesh<V> {
  pub vertices: Vec<V>,
  pub indices: Vec<u32>,
  pub bounds: MinMaxAABB,
  vertex_capacity: usize,
  index_capacity: usize,
  /// Number of `reallocate` calls so far.
  pub reallocations: usize,
}

impl<V> Default for CpuMesh<V> {
  fn default() -> Self {
    Self {
      vertices: Vec::new(),
      indices: Vec::new(),
      bounds: MinMaxAABB::empty(),
      vertex_capacity: 0,
      index_capacity: 0,
      reallocations: 0,
    }
  }
}

impl<V> CpuMesh<V> {
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}

impl<V: Pod + Send> MeshResource<V> for CpuMesh<V> {
  fn vertex_capacity(&self) -> usize {
    self.vertex_capacity
  }

  fn index_capacity(&self) -> usize {
    self.index_capacity
  }

  fn reallocate(&mut self, vertex_capacity: usize, index_capacity: usize) {
    self.vertices = Vec::with_capacity(vertex_capacity);
    self.indices = Vec::with_capacity(index_capacity);
    self.vertex_capacity = vertex_capacity;
    self.index_capacity = index_capacity;
    self.reallocations += 1;
  }

  fn write(&mut self, vertices: &[V], indices: &[u32], bounds: MinMaxAABB) {
    debug_assert!(vertices.len() <= self.vertex_capacity);
    debug_assert!(indices.len() <= self.index_capacity);
    self.vertices.clear();
    self.vertices.extend_from_slice(vertices);
    self.indices.clear();
    self.indices.extend_from_slice(indices);
    self.bounds = bounds;
  }
}

/// Texture kept in memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CpuTexture {
  pub side: usize,
  pub texels: Vec<u8>,
  /// Number of `write` calls so far.
  pub writes: usize,
}

impl TextureResource for CpuTexture {
  fn side(&self) -> usize {
    self.side
  }

  fn write(&mut self, samples: &[u8]) {
    debug_assert_eq!(samples.len(), self.side * self.side);
    self.texels.clear();
    self.texels.extend_from_slice(samples);
    self.writes += 1;
  }
}

/// Factory for [`CpuMesh`] and [`CpuTexture`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuResources;

impl ResourceFactory for CpuResources {
  type Mesh = CpuMesh<Vertex>;
  type CollisionMesh = CpuMesh<CollisionVertex>;
  type Texture = CpuTexture;

  fn create_mesh(&mut self) -> Self::Mesh {
    CpuMesh::default()
  }

  fn create_collision_mesh(&mut self) -> Self::CollisionMesh {
    CpuMesh::default()
  }

  fn create_texture(&mut self, side: usize) -> Self::Texture {
    CpuTexture {
      side,
      texels: vec![0; side * side],
      writes: 0,
    }
  }
}

#[cfg(test)]
#[path = "resources_test.rs"]
mod resources_test;
