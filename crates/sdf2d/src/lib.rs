//! sdf2d - Chunked 2D signed distance fields with extruded mesh output
//!
//! Shapes are signed distance functions in the XY plane. A [`World`] keeps
//! layers of square chunks, each holding a byte-quantized distance grid.
//! Adding or subtracting a shape resamples the chunks it can reach; dirty
//! chunks are traced into edge loops, triangulated, extruded along Z and
//! clipped to the chunk square on a background pool. The owning thread
//! uploads the results through host-provided mesh and texture resources.
//!
//! # Features
//!
//! - **Marching squares** contour tracing with saddle disambiguation and
//!   seam-exact vertices between neighbouring chunks
//! - **Extrusion** with sharp, beveled or rounded edges and smoothing-angle
//!   controlled wall normals
//! - **Async rebuilds** on rayon with stale-result discarding
//! - **Persistent histories** through a tagged shape registry
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use glam::Vec2;
//! use sdf2d::{CircleSdf, LayerConfig, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default());
//! let layer = world.add_layer(LayerConfig::default().with_depth(32.0));
//! world.add(layer, Arc::new(CircleSdf::new(Vec2::ZERO, 50.0)))?;
//! world.flush(Duration::from_secs(1));
//! ```

pub mod constants;
pub mod error;
pub mod quality;
pub mod types;

pub use constants::{APRON, FAR_OUTSIDE, SURFACE};
pub use error::{MeshError, ShapeError, WorldError};
pub use quality::{Quality, QualityPreset};
pub use types::{
  sdf_conversion, Aabb2, CollisionVertex, HasPosition, MaterialId, MeshOutput, MinMaxAABB, Vertex,
};

// Shapes and their persistence
pub mod shapes;
pub use shapes::{
  CircleSdf, DistanceField, Expand, LineSdf, RectSdf, Shape, ShapeRef, ShapeRegistry, ShapeType,
  TextureSdf, Transform, Translate,
};

// Quantized sample grids
pub mod sample_array;
pub use sample_array::{Modification, Op, SampleArray};

// Surface extraction
pub mod contour;
pub mod mesher;
pub mod polygon;
pub use contour::{ContourTracer, Contours, EdgeLoop};
pub use mesher::{ChunkMeshes, ContourMesher, MeshJob, MeshSettings, Mesher, MesherScratch};

// Scratch reuse across rebuilds
pub mod pool;
pub use pool::{Reset, ScratchPool};

// Host resources
pub mod resources;
pub use resources::{
  CpuMesh, CpuResources, CpuTexture, MeshResource, ResourceFactory, TextureResource, UploadKind,
};

// Chunks, layers and the world
pub mod chunk;
pub mod layer;
pub mod rebuild;
pub mod world;
pub use chunk::{Chunk, ChunkCoord, ChunkGrid, ChunkKey, ChunkRange, ChunkStore};
pub use layer::{EdgeStyle, LayerConfig, LayerId};
pub use rebuild::{JobId, RebuildQueue, RebuildResult};
pub use world::{chunk_intersects, chunk_range, TickStats, World, WorldConfig};

// Engine-agnostic metrics
pub mod metrics;
pub use metrics::WorldMetrics;
