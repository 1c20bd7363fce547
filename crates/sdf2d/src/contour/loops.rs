//! Loop clean-up: collinear vertex removal, signed area and bounds.

use glam::Vec2;

use crate::constants::{BOUNDARY_EPSILON, COLLINEAR_DOT};
use crate::types::Aabb2;

/// Shoelace signed area. Positive for counter-clockwise loops.
pub fn signed_area(points: &[Vec2]) -> f32 {
  let n = points.len();
  if n < 3 {
    return 0.0;
  }
  let mut twice = 0.0;
  for i in 0..n {
    let p = points[i];
    let q = points[(i + 1) % n];
    twice += p.x * q.y - q.x * p.y;
  }
  twice * 0.5
}

/// True if `point` lies on the square chunk boundary `|x| = half` or
/// `|y| = half`.
#[inline]
pub fn on_chunk_boundary(point: Vec2, half_size: f32) -> bool {
  (point.x.abs() - half_size).abs() <= BOUNDARY_EPSILON
    || (point.y.abs() - half_size).abs() <= BOUNDARY_EPSILON
}

/// Remove vertices whose neighbouring edges are (nearly) parallel, in place.
///
/// `synthetic` runs parallel to `points` and is compacted with it. Vertices
/// on the chunk boundary are always kept so both chunks sharing an edge end
/// their contours at identical points. A vertex whose flag differs from a
/// neighbour's is kept too, so merged edges never mix real and synthetic
/// stretches.
pub fn remove_collinear(points: &mut Vec<Vec2>, synthetic: &mut Vec<bool>, half_size: f32) {
  debug_assert_eq!(points.len(), synthetic.len());
  loop {
    let n = points.len();
    if n < 3 {
      return;
    }

    // Kept vertices are compacted into `..kept`; `i + 1` is never overwritten
    // before it is read.
    let mut kept = 0;
    for i in 0..n {
      let current = points[i];
      let flag = synthetic[i];
      let (prev, prev_flag) = if kept > 0 {
        (points[kept - 1], synthetic[kept - 1])
      } else {
        (points[n - 1], synthetic[n - 1])
      };
      let (next, next_flag) = (points[(i + 1) % n], synthetic[(i + 1) % n]);

      let incoming = (current - prev).normalize_or_zero();
      let outgoing = (next - current).normalize_or_zero();
      let degenerate = incoming == Vec2::ZERO || outgoing == Vec2::ZERO;
      let keep = if on_chunk_boundary(current, half_size) {
        true
      } else if degenerate {
        false
      } else {
        flag != prev_flag || flag != next_flag || incoming.dot(outgoing) <= COLLINEAR_DOT
      };

      if keep {
        points[kept] = current;
        synthetic[kept] = flag;
        kept += 1;
      }
    }

    // The first vertex was judged against the unfiltered last one; repeat
    // until nothing else collapses.
    if kept == n {
      return;
    }
    points.truncate(kept);
    synthetic.truncate(kept);
  }
}

pub fn loop_bounds(points: &[Vec2]) -> Aabb2 {
  Aabb2::from_points(points.iter().copied())
}

/// Even-odd point-in-polygon test.
pub fn contains_point(points: &[Vec2], point: Vec2) -> bool {
  let n = points.len();
  let mut inside = false;
  let mut j = n.wrapping_sub(1);
  for i in 0..n {
    let a = points[i];
    let b = points[j];
    if (a.y > point.y) != (b.y > point.y) {
      let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
      if point.x < x {
        inside = !inside;
      }
    }
    j = i;
  }
  inside
}
