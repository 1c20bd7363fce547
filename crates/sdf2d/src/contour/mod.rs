//! Contour tracer: samples to closed edge loops.
//!
//! ```text
//!   samples ─► per-cell segments ─► stitch by vertex key ─► loops
//!              (case_table)         (HashMap)              │
//!                                                          ├─ drop collinear
//!                                                          ├─ signed area
//!                                                          └─ drop < 3 / tiny
//! ```
//!
//! Cells are walked over `-1..side` on both axes. Lookups off the grid read
//! as far outside, so the tracer sees a ring of empty samples around the
//! chunk and every loop closes. Crossings on grid edges that touch the ring
//! are marked synthetic: they exist only because the stored grid ends, and
//! the extruder keeps edges through them out of insets and walls.
//!
//! A crossing lives on one grid edge and is keyed by the edge's lower sample
//! and its axis. Both cells sharing that edge compute the same key, which is
//! what joins their segments. Byte samples never equal the 127.5 threshold,
//! so crossings never fall exactly on a grid corner and corner keys do not
//! exist.

pub mod case_table;
pub mod loops;

use std::collections::HashMap;
use std::fmt::Write as _;

use glam::Vec2;

use crate::constants::{MIN_LOOP_AREA, SURFACE};
use crate::pool::Reset;
use crate::quality::Quality;
use crate::sample_array::{lookup, sample_position};
use crate::types::Aabb2;
use case_table::{cell_segments, CellEdge};

/// Orientation of the grid edge a crossing lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeAxis {
  /// From sample `(x, y)` to `(x + 1, y)`.
  Horizontal,
  /// From sample `(x, y)` to `(x, y + 1)`.
  Vertical,
}

/// Canonical identity of a surface crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexKey {
  pub x: i32,
  pub y: i32,
  pub axis: EdgeAxis,
}

impl VertexKey {
  /// Key of `edge` in the cell whose bottom-left sample is `(x, y)`.
  #[inline]
  pub fn from_cell_edge(x: i32, y: i32, edge: CellEdge) -> Self {
    let (x, y, axis) = match edge {
      CellEdge::Bottom => (x, y, EdgeAxis::Horizontal),
      CellEdge::Top => (x, y + 1, EdgeAxis::Horizontal),
      CellEdge::Left => (x, y, EdgeAxis::Vertical),
      CellEdge::Right => (x + 1, y, EdgeAxis::Vertical),
    };
    Self { x, y, axis }
  }

  /// True if either end of the grid edge lies on the virtual ring around a
  /// grid of `side` samples per axis.
  #[inline]
  pub fn touches_ring(&self, side: i32) -> bool {
    let ((x0, y0), (x1, y1)) = self.endpoints();
    [x0, y0, x1, y1].iter().any(|&c| c < 0 || c >= side)
  }

  /// Sample coordinates at the two ends of the grid edge.
  #[inline]
  pub fn endpoints(&self) -> ((i32, i32), (i32, i32)) {
    match self.axis {
      EdgeAxis::Horizontal => ((self.x, self.y), (self.x + 1, self.y)),
      EdgeAxis::Vertical => ((self.x, self.y), (self.x, self.y + 1)),
    }
  }
}

/// One closed loop inside [`Contours::vertices`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeLoop {
  pub first: usize,
  pub count: usize,
  /// Positive for outer boundaries, negative for holes.
  pub area: f32,
  pub bounds: Aabb2,
}

impl EdgeLoop {
  #[inline]
  pub fn is_outer(&self) -> bool {
    self.area > 0.0
  }

  #[inline]
  pub fn is_hole(&self) -> bool {
    self.area < 0.0
  }

  #[inline]
  pub fn range(&self) -> std::ops::Range<usize> {
    self.first..self.first + self.count
  }
}

/// Traced loops of one chunk, in chunk-local coordinates.
#[derive(Clone, Debug, Default)]
pub struct Contours {
  pub vertices: Vec<Vec2>,
  /// Parallel to `vertices`: the crossing touches the virtual ring.
  pub synthetic: Vec<bool>,
  pub loops: Vec<EdgeLoop>,
}

impl Contours {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.loops.is_empty()
  }

  pub fn clear(&mut self) {
    self.vertices.clear();
    self.synthetic.clear();
    self.loops.clear();
  }

  #[inline]
  pub fn loop_points(&self, edge_loop: &EdgeLoop) -> &[Vec2] {
    &self.vertices[edge_loop.range()]
  }

  #[inline]
  pub fn loop_synthetic(&self, edge_loop: &EdgeLoop) -> &[bool] {
    &self.synthetic[edge_loop.range()]
  }

  pub fn outer_loops(&self) -> impl Iterator<Item = &EdgeLoop> {
    self.loops.iter().filter(|l| l.is_outer())
  }

  pub fn holes(&self) -> impl Iterator<Item = &EdgeLoop> {
    self.loops.iter().filter(|l| l.is_hole())
  }

  /// Add a loop; returns `false` (and stores nothing) if it is degenerate.
  pub fn push_loop(&mut self, points: &[Vec2]) -> bool {
    self.push_marked_loop(points, &[])
  }

  /// [`push_loop`](Self::push_loop) with a synthetic flag per point. An
  /// empty `synthetic` marks every point real.
  pub fn push_marked_loop(&mut self, points: &[Vec2], synthetic: &[bool]) -> bool {
    debug_assert!(synthetic.is_empty() || synthetic.len() == points.len());
    if points.len() < 3 {
      return false;
    }
    let area = loops::signed_area(points);
    if area.abs() < MIN_LOOP_AREA {
      return false;
    }
    self.loops.push(EdgeLoop {
      first: self.vertices.len(),
      count: points.len(),
      area,
      bounds: loops::loop_bounds(points),
    });
    self.vertices.extend_from_slice(points);
    if synthetic.is_empty() {
      self.synthetic.resize(self.vertices.len(), false);
    } else {
      self.synthetic.extend_from_slice(synthetic);
    }
    true
  }

  /// Plain-text listing of every loop, for failure reports.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    for (index, edge_loop) in self.loops.iter().enumerate() {
      let _ = write!(
        out,
        "loop {index} area={} count={}:",
        edge_loop.area, edge_loop.count
      );
      for point in self.loop_points(edge_loop) {
        let _ = write!(out, " {},{}", point.x, point.y);
      }
      out.push('\n');
    }
    out
  }
}

impl Reset for Contours {
  fn reset(&mut self) {
    self.clear();
  }
}

/// Reusable tracer state.
#[derive(Debug, Default)]
pub struct ContourTracer {
  segments: Vec<(VertexKey, VertexKey)>,
  by_start: HashMap<VertexKey, usize>,
  visited: Vec<bool>,
  ring: Vec<Vec2>,
  ring_synthetic: Vec<bool>,
}

impl Reset for ContourTracer {
  fn reset(&mut self) {
    self.segments.clear();
    self.by_start.clear();
    self.visited.clear();
    self.ring.clear();
    self.ring_synthetic.clear();
  }
}

impl ContourTracer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Trace `samples` (row-major, `quality.sample_side()` per axis) into
  /// `out`, replacing its contents.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "contour::trace"))]
  pub fn trace(&mut self, samples: &[u8], quality: &Quality, out: &mut Contours) {
    self.reset();
    out.clear();

    let side = quality.sample_side();
    debug_assert_eq!(samples.len(), side * side);
    let s = side as i32;

    for y in -1..s {
      for x in -1..s {
        let a = lookup(samples, side, x, y);
        let b = lookup(samples, side, x + 1, y);
        let c = lookup(samples, side, x, y + 1);
        let d = lookup(samples, side, x + 1, y + 1);
        for &(from, to) in cell_segments(a, b, c, d) {
          let start = VertexKey::from_cell_edge(x, y, from);
          let end = VertexKey::from_cell_edge(x, y, to);
          self.by_start.insert(start, self.segments.len());
          self.segments.push((start, end));
        }
      }
    }

    self.visited.resize(self.segments.len(), false);
    let half_size = quality.chunk_size * 0.5;

    for first in 0..self.segments.len() {
      if self.visited[first] {
        continue;
      }

      self.ring.clear();
      self.ring_synthetic.clear();
      let start_key = self.segments[first].0;
      let mut current = first;
      let closed = loop {
        self.visited[current] = true;
        let (key, next_key) = self.segments[current];
        self.ring.push(crossing_position(samples, side, quality, key));
        self.ring_synthetic.push(key.touches_ring(s));
        if next_key == start_key {
          break true;
        }
        match self.by_start.get(&next_key) {
          Some(&next) if !self.visited[next] => current = next,
          _ => break false,
        }
      };

      if !closed {
        tracing::warn!(
          start = ?start_key,
          vertices = self.ring.len(),
          "dropping open contour chain"
        );
        continue;
      }

      loops::remove_collinear(&mut self.ring, &mut self.ring_synthetic, half_size);
      if !out.push_marked_loop(&self.ring, &self.ring_synthetic) {
        tracing::debug!(vertices = self.ring.len(), "dropping degenerate loop");
      }
    }
  }
}

/// Chunk-local position of the crossing `key`, interpolated linearly between
/// the two samples of its grid edge.
pub fn crossing_position(samples: &[u8], side: usize, quality: &Quality, key: VertexKey) -> Vec2 {
  let ((x0, y0), (x1, y1)) = key.endpoints();
  let v0 = lookup(samples, side, x0, y0) as f32;
  let v1 = lookup(samples, side, x1, y1) as f32;
  let t = if v1 != v0 {
    ((SURFACE - v0) / (v1 - v0)).clamp(0.0, 1.0)
  } else {
    0.5
  };
  let p0 = sample_position(quality, x0 as f32, y0 as f32);
  let p1 = sample_position(quality, x1 as f32, y1 as f32);
  p0.lerp(p1, t)
}

/// Trace `samples` with a throwaway tracer.
pub fn trace(samples: &[u8], quality: &Quality) -> Contours {
  let mut out = Contours::new();
  ContourTracer::new().trace(samples, quality, &mut out);
  out
}
