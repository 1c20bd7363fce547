//! Double-buffered quantized distance grid for one chunk of one layer.
//!
//! ```text
//!   front ──► read by mesher snapshots and texture upload
//!   back  ──► copy of front, then sampled in parallel rows
//!             │
//!             └── any byte changed? ── yes ─► flip front index
//!                                   └─ no  ─► nothing published
//! ```
//!
//! Union writes `min(existing, q)` and subtraction writes
//! `max(existing, 255 - q)`, where `q` is the shape's quantized distance.
//! Samples at or beyond `max_distance` outside a shape are left alone: the
//! shape cannot change them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::Vec2;
use rayon::prelude::*;

use crate::constants::{sample_index, APRON, FAR_OUTSIDE};
use crate::quality::Quality;
use crate::shapes::{DistanceField, ShapeRef};
use crate::types::{sdf_conversion, Aabb2};

/// Boolean operation applied by a modification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
  Add,
  Subtract,
}

impl Op {
  /// Persisted byte value.
  pub fn to_byte(self) -> u8 {
    match self {
      Op::Add => 0,
      Op::Subtract => 1,
    }
  }

  pub fn from_byte(value: u8) -> Option<Self> {
    match value {
      0 => Some(Op::Add),
      1 => Some(Op::Subtract),
      _ => None,
    }
  }
}

/// One recorded shape application.
#[derive(Clone, Debug)]
pub struct Modification {
  pub op: Op,
  pub shape: ShapeRef,
}

impl Modification {
  pub fn add(shape: ShapeRef) -> Self {
    Self { op: Op::Add, shape }
  }

  pub fn subtract(shape: ShapeRef) -> Self {
    Self {
      op: Op::Subtract,
      shape,
    }
  }
}

/// Sample at `(x, y)`, or [`FAR_OUTSIDE`] for lookups off the grid.
#[inline(always)]
pub fn lookup(samples: &[u8], side: usize, x: i32, y: i32) -> u8 {
  if x < 0 || y < 0 || x as usize >= side || y as usize >= side {
    return FAR_OUTSIDE;
  }
  samples[sample_index(x as usize, y as usize, side)]
}

/// Inclusive-exclusive sample index window `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SampleRegion {
  pub x0: usize,
  pub x1: usize,
  pub y0: usize,
  pub y1: usize,
}

/// Per-chunk distance storage with a front and a back buffer.
#[derive(Debug)]
pub struct SampleArray {
  quality: Quality,
  side: usize,
  buffers: [Arc<Vec<u8>>; 2],
  front: AtomicUsize,
}

impl Clone for SampleArray {
  fn clone(&self) -> Self {
    Self {
      quality: self.quality,
      side: self.side,
      buffers: self.buffers.clone(),
      front: AtomicUsize::new(self.front.load(Ordering::Acquire)),
    }
  }
}

impl SampleArray {
  /// Empty array: every sample far outside.
  pub fn new(quality: Quality) -> Self {
    let side = quality.sample_side();
    Self {
      quality,
      side,
      buffers: [
        Arc::new(vec![FAR_OUTSIDE; side * side]),
        Arc::new(vec![FAR_OUTSIDE; side * side]),
      ],
      front: AtomicUsize::new(0),
    }
  }

  pub fn quality(&self) -> &Quality {
    &self.quality
  }

  /// Samples per axis, aprons included.
  #[inline]
  pub fn side(&self) -> usize {
    self.side
  }

  /// Published samples, row-major.
  #[inline]
  pub fn front(&self) -> &[u8] {
    &self.buffers[self.front.load(Ordering::Acquire)]
  }

  /// Shared handle to the published samples.
  ///
  /// A snapshot stays valid while later mutations write the other buffer;
  /// if it is still alive when that buffer is needed again, the array
  /// allocates a fresh one instead of writing under the reader.
  pub fn snapshot(&self) -> Arc<Vec<u8>> {
    Arc::clone(&self.buffers[self.front.load(Ordering::Acquire)])
  }

  /// True when every sample is far outside.
  pub fn is_empty(&self) -> bool {
    self.front().iter().all(|&value| value == FAR_OUTSIDE)
  }

  /// Published sample at `(x, y)`; [`FAR_OUTSIDE`] off the grid.
  #[inline]
  pub fn sample(&self, x: i32, y: i32) -> u8 {
    lookup(self.front(), self.side, x, y)
  }

  /// Chunk-local position of sample `(x, y)`.
  #[inline]
  pub fn sample_position(&self, x: usize, y: usize) -> Vec2 {
    sample_position(&self.quality, x as f32, y as f32)
  }

  /// Union `field` into the samples. Returns whether any sample changed.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "sample_array::add"))]
  pub fn add<F: DistanceField + Sync + ?Sized>(&mut self, field: &F) -> bool {
    self.apply(field, Op::Add)
  }

  /// Subtract `field` from the samples. Returns whether any sample changed.
  #[cfg_attr(
    feature = "profiling",
    tracing::instrument(skip_all, name = "sample_array::subtract")
  )]
  pub fn subtract<F: DistanceField + Sync + ?Sized>(&mut self, field: &F) -> bool {
    self.apply(field, Op::Subtract)
  }

  /// Reset to empty and replay `modifications` in order.
  ///
  /// Produces the same bytes as applying the list one by one to a fresh
  /// array. Returns whether the published samples differ from before.
  pub fn rebuild(&mut self, modifications: &[Modification]) -> bool {
    let before = self.snapshot();
    self.reset();
    for modification in modifications {
      self.apply(modification.shape.as_ref(), modification.op);
    }
    self.front() != before.as_slice()
  }

  /// Set every sample of both buffers far outside.
  pub fn reset(&mut self) {
    for buffer in &mut self.buffers {
      Arc::make_mut(buffer).fill(FAR_OUTSIDE);
    }
    self.front.store(0, Ordering::Release);
  }

  /// Sample window a shape with `bounds` can influence, or `None` if it
  /// misses the grid.
  pub(crate) fn region(&self, bounds: Aabb2) -> Option<SampleRegion> {
    if !bounds.is_valid() {
      return None;
    }
    let grown = bounds.grow(self.quality.influence_margin());
    let half = self.quality.chunk_size * 0.5;
    let unit = self.quality.unit_size;
    let side = self.side as f32;
    let to_index = |v: f32| (v + half) / unit + APRON as f32;

    let lo = |v: f32| to_index(v).floor().clamp(0.0, side) as usize;
    let hi = |v: f32| (to_index(v).ceil() + 1.0).clamp(0.0, side) as usize;

    let region = SampleRegion {
      x0: lo(grown.min.x),
      x1: hi(grown.max.x),
      y0: lo(grown.min.y),
      y1: hi(grown.max.y),
    };
    (region.x0 < region.x1 && region.y0 < region.y1).then_some(region)
  }

  fn apply<F: DistanceField + Sync + ?Sized>(&mut self, field: &F, op: Op) -> bool {
    let Some(region) = self.region(field.bounds()) else {
      return false;
    };

    let front_index = self.front.load(Ordering::Acquire);
    let back_index = 1 - front_index;
    let front = Arc::clone(&self.buffers[front_index]);
    let back = Arc::make_mut(&mut self.buffers[back_index]);
    back.copy_from_slice(&front);

    let quality = self.quality;
    let max_distance = quality.max_distance;
    let side = self.side;

    let changed = back
      .par_chunks_mut(side)
      .enumerate()
      .skip(region.y0)
      .take(region.y1 - region.y0)
      .map(|(y, row)| {
        let mut row_changed = false;
        for (x, existing) in row
          .iter_mut()
          .enumerate()
          .take(region.x1)
          .skip(region.x0)
        {
          let distance = field.distance(sample_position(&quality, x as f32, y as f32));
          // Also rejects NaN.
          if !(distance < max_distance) {
            continue;
          }
          let q = sdf_conversion::to_storage(distance, max_distance);
          let value = match op {
            Op::Add => (*existing).min(q),
            Op::Subtract => (*existing).max(FAR_OUTSIDE - q),
          };
          if value != *existing {
            *existing = value;
            row_changed = true;
          }
        }
        row_changed
      })
      .reduce(|| false, |a, b| a | b);

    if changed {
      self.front.store(back_index, Ordering::Release);
    }
    changed
  }
}

/// Chunk-local position of (possibly fractional) sample coordinates.
#[inline(always)]
pub fn sample_position(quality: &Quality, x: f32, y: f32) -> Vec2 {
  let origin = -quality.chunk_size * 0.5 - APRON as f32 * quality.unit_size;
  Vec2::new(origin + x * quality.unit_size, origin + y * quality.unit_size)
}

#[cfg(test)]
#[path = "sample_array_test.rs"]
mod sample_array_test;
