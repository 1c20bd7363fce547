//! Cap triangulation: holes to outer loops, bridges, ear clipping.
//!
//! ```text
//!   loops ─► pair each hole with the smallest outer loop containing it
//!         ─► per outer loop: bridge holes in (rightmost hole first)
//!         ─► ear-clip the single merged ring
//! ```
//!
//! Indices refer to [`Contours::vertices`], so every consumer that offsets
//! the contour (cap insets) can reuse the triangles as-is. Triangles wind
//! counter-clockwise.

use glam::Vec2;

use crate::contour::{loops, Contours};
use crate::error::MeshError;
use crate::pool::Reset;

/// An outer loop and the holes it contains (indices into `Contours::loops`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonGroup {
  pub outer: usize,
  pub holes: Vec<usize>,
}

/// Working buffers for [`Triangulator`].
#[derive(Debug, Default)]
pub struct Triangulator {
  groups: Vec<PolygonGroup>,
  ring: Vec<u32>,
  hole_order: Vec<usize>,
}

impl Reset for Triangulator {
  fn reset(&mut self) {
    self.groups.clear();
    self.ring.clear();
    self.hole_order.clear();
  }
}

const AREA_EPSILON: f32 = 1e-9;

#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
  (a - o).perp_dot(b - o)
}

impl Triangulator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Outer/hole pairing from the last call to [`Triangulator::triangulate`].
  pub fn groups(&self) -> &[PolygonGroup] {
    &self.groups
  }

  /// Fill every polygon of `contours`, appending index triples to
  /// `triangles`.
  pub fn triangulate(
    &mut self,
    contours: &Contours,
    triangles: &mut Vec<u32>,
  ) -> Result<(), MeshError> {
    self.reset();
    for (index, edge_loop) in contours.loops.iter().enumerate() {
      if !contours
        .loop_points(edge_loop)
        .iter()
        .all(|p| p.is_finite())
      {
        return Err(MeshError::NonFinite { index });
      }
    }

    self.pair_holes(contours)?;

    let groups = std::mem::take(&mut self.groups);
    let result = groups
      .iter()
      .try_for_each(|group| self.fill_group(contours, group, triangles));
    self.groups = groups;
    result
  }

  fn pair_holes(&mut self, contours: &Contours) -> Result<(), MeshError> {
    let mut outer_slot = vec![usize::MAX; contours.loops.len()];
    for (index, edge_loop) in contours.loops.iter().enumerate() {
      if edge_loop.is_outer() {
        outer_slot[index] = self.groups.len();
        self.groups.push(PolygonGroup {
          outer: index,
          holes: Vec::new(),
        });
      }
    }

    for (index, hole) in contours.loops.iter().enumerate() {
      if !hole.is_hole() {
        continue;
      }
      let anchor = contours.vertices[hole.first];
      let container = contours
        .loops
        .iter()
        .enumerate()
        .filter(|(_, outer)| {
          outer.is_outer()
            && outer.bounds.contains_point(anchor)
            && loops::contains_point(contours.loop_points(outer), anchor)
        })
        .min_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
        .map(|(outer, _)| outer)
        .ok_or(MeshError::OrphanHole { index })?;
      self.groups[outer_slot[container]].holes.push(index);
    }
    Ok(())
  }

  fn fill_group(
    &mut self,
    contours: &Contours,
    group: &PolygonGroup,
    triangles: &mut Vec<u32>,
  ) -> Result<(), MeshError> {
    let points = &contours.vertices;
    let outer = &contours.loops[group.outer];
    self.ring.clear();
    self.ring.extend(outer.range().map(|i| i as u32));

    // Rightmost hole first so later bridges cannot cross earlier ones.
    self.hole_order.clear();
    self.hole_order.extend_from_slice(&group.holes);
    self
      .hole_order
      .sort_by(|&a, &b| contours.loops[b].bounds.max.x.total_cmp(&contours.loops[a].bounds.max.x));

    for position in 0..self.hole_order.len() {
      let hole = contours.loops[self.hole_order[position]];
      let pending = &self.hole_order[position + 1..];
      bridge_hole(contours, &mut self.ring, hole.range(), pending)?;
    }

    ear_clip(points, &mut self.ring, triangles)
  }
}

/// Splice a hole into `ring` through a bridge from the hole's rightmost
/// vertex to a visible ring vertex.
fn bridge_hole(
  contours: &Contours,
  ring: &mut Vec<u32>,
  hole: std::ops::Range<usize>,
  pending: &[usize],
) -> Result<(), MeshError> {
  let points = &contours.vertices;
  let hole_start = hole
    .clone()
    .max_by(|&a, &b| {
      points[a]
        .x
        .total_cmp(&points[b].x)
        .then(points[b].y.total_cmp(&points[a].y))
    })
    .unwrap_or(hole.start);
  let m = points[hole_start];

  let blocked = |a: Vec2, b: Vec2| {
    let crosses_ring = (0..ring.len()).any(|i| {
      let p = points[ring[i] as usize];
      let q = points[ring[(i + 1) % ring.len()] as usize];
      segments_cross(a, b, p, q)
    });
    let crosses_hole = |range: std::ops::Range<usize>| {
      let n = range.len();
      range.clone().any(|i| {
        let next = range.start + (i - range.start + 1) % n;
        segments_cross(a, b, points[i], points[next])
      })
    };
    crosses_ring
      || crosses_hole(hole.clone())
      || pending
        .iter()
        .any(|&l| crosses_hole(contours.loops[l].range()))
  };

  // Candidates to the right of the hole first, then nearest first.
  let mut candidates: Vec<usize> = (0..ring.len()).collect();
  candidates.sort_by(|&a, &b| {
    let pa = points[ring[a] as usize];
    let pb = points[ring[b] as usize];
    (pa.x < m.x)
      .cmp(&(pb.x < m.x))
      .then(pa.distance_squared(m).total_cmp(&pb.distance_squared(m)))
  });

  let target = candidates
    .into_iter()
    .find(|&c| {
      let p = points[ring[c] as usize];
      p != m && !blocked(m, p) && bridge_enters_interior(points, ring, c, m)
    })
    .ok_or(MeshError::Triangulation {
      remaining: ring.len() + hole.len(),
    })?;

  // ring[..=target], hole from m around back to m, ring[target], rest.
  let n = hole.len();
  let offset = hole_start - hole.start;
  let mut spliced = Vec::with_capacity(ring.len() + n + 2);
  spliced.extend_from_slice(&ring[..=target]);
  spliced.extend((0..=n).map(|k| (hole.start + (offset + k) % n) as u32));
  spliced.extend_from_slice(&ring[target..]);
  *ring = spliced;
  Ok(())
}

/// True if the bridge from ring vertex `at` towards `m` leaves through the
/// polygon's interior angle at that vertex.
fn bridge_enters_interior(points: &[Vec2], ring: &[u32], at: usize, m: Vec2) -> bool {
  let n = ring.len();
  let prev = points[ring[(at + n - 1) % n] as usize];
  let here = points[ring[at] as usize];
  let next = points[ring[(at + 1) % n] as usize];
  if cross(prev, here, next) >= 0.0 {
    // Convex: m must be left of both edges.
    cross(prev, here, m) >= 0.0 && cross(here, next, m) >= 0.0
  } else {
    // Reflex: left of either edge.
    cross(prev, here, m) >= 0.0 || cross(here, next, m) >= 0.0
  }
}

/// Proper intersection (shared endpoints and touching do not count).
fn segments_cross(a: Vec2, b: Vec2, p: Vec2, q: Vec2) -> bool {
  if a == p || a == q || b == p || b == q {
    return false;
  }
  let d1 = cross(p, q, a);
  let d2 = cross(p, q, b);
  let d3 = cross(a, b, p);
  let d4 = cross(a, b, q);
  ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
    && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Inclusive point-in-triangle for a counter-clockwise triangle.
fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
  cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clip a counter-clockwise ring (consumed).
pub fn ear_clip(points: &[Vec2], ring: &mut Vec<u32>, triangles: &mut Vec<u32>) -> Result<(), MeshError> {
  let mut cursor = 0;
  let mut stalled = 0;

  while ring.len() > 3 {
    let n = ring.len();
    if stalled >= n {
      // No ear left: drop a degenerate vertex if there is one.
      match (0..n).find(|&i| {
        let a = points[ring[(i + n - 1) % n] as usize];
        let b = points[ring[i] as usize];
        let c = points[ring[(i + 1) % n] as usize];
        cross(a, b, c).abs() <= AREA_EPSILON
      }) {
        Some(i) => {
          ring.remove(i);
          stalled = 0;
          continue;
        }
        None => return Err(MeshError::Triangulation { remaining: n }),
      }
    }

    let i = cursor % n;
    let ia = ring[(i + n - 1) % n];
    let ib = ring[i];
    let ic = ring[(i + 1) % n];

    if is_ear(points, ring, (i + n - 1) % n, i, (i + 1) % n) {
      triangles.extend_from_slice(&[ia, ib, ic]);
      ring.remove(i);
      stalled = 0;
      // Step back so the new neighbour pair is checked next.
      cursor = if i == 0 { 0 } else { i - 1 };
    } else {
      cursor = i + 1;
      stalled += 1;
    }
  }

  if ring.len() == 3 {
    let (a, b, c) = (
      points[ring[0] as usize],
      points[ring[1] as usize],
      points[ring[2] as usize],
    );
    if cross(a, b, c) > AREA_EPSILON {
      triangles.extend_from_slice(&[ring[0], ring[1], ring[2]]);
    }
  }
  ring.clear();
  Ok(())
}

fn is_ear(points: &[Vec2], ring: &[u32], ia: usize, ib: usize, ic: usize) -> bool {
  let a = points[ring[ia] as usize];
  let b = points[ring[ib] as usize];
  let c = points[ring[ic] as usize];
  if cross(a, b, c) <= AREA_EPSILON {
    return false;
  }
  ring.iter().enumerate().all(|(k, &index)| {
    if k == ia || k == ib || k == ic {
      return true;
    }
    let p = points[index as usize];
    // Bridge duplicates of a corner do not block the ear.
    p == a || p == b || p == c || !in_triangle(p, a, b, c)
  })
}

#[cfg(test)]
#[path = "triangulate_test.rs"]
mod triangulate_test;
