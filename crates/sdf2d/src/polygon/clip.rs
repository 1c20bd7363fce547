//! Triangle clipping against an axis-aligned rectangle in XY.
//!
//! Four half-plane passes (`x >= min.x`, `x <= max.x`, `y >= min.y`,
//! `y <= max.y`) of Sutherland–Hodgman per triangle. Triangles fully inside
//! keep their shared vertices; clipped ones are fan-triangulated from fresh
//! vertices. New vertices land exactly on the clip plane.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::types::{Aabb2, CollisionVertex, HasPosition, MeshOutput, Vertex};

/// Slack for the fully-inside fast path.
const INSIDE_EPSILON: f32 = 1e-4;

/// Twice the area below which a clipped triangle is dropped.
const SLIVER_AREA: f32 = 1e-10;

/// Vertex types the clipper can interpolate.
pub trait ClipVertex: Copy + HasPosition {
  /// Vertex `t` of the way from `self` to `other`.
  fn interpolate(&self, other: &Self, t: f32) -> Self;

  /// Overwrite one position component (0 = x, 1 = y).
  fn pin_axis(&mut self, axis: usize, value: f32);
}

impl ClipVertex for Vertex {
  fn interpolate(&self, other: &Self, t: f32) -> Self {
    let position = Vec3::from_array(self.position).lerp(Vec3::from_array(other.position), t);
    let normal = slerp(
      Vec3::from_array(self.normal),
      Vec3::from_array(other.normal),
      t,
    );
    let tangent = slerp(
      Vec3::from_slice(&self.tangent[..3]),
      Vec3::from_slice(&other.tangent[..3]),
      t,
    );
    let uv = Vec2::from_array(self.uv).lerp(Vec2::from_array(other.uv), t);
    Vertex {
      position: position.to_array(),
      normal: normal.to_array(),
      tangent: [tangent.x, tangent.y, tangent.z, self.tangent[3]],
      uv: uv.to_array(),
    }
  }

  #[inline]
  fn pin_axis(&mut self, axis: usize, value: f32) {
    self.position[axis] = value;
  }
}

impl ClipVertex for CollisionVertex {
  fn interpolate(&self, other: &Self, t: f32) -> Self {
    let position = Vec3::from_array(self.position).lerp(Vec3::from_array(other.position), t);
    CollisionVertex {
      position: position.to_array(),
    }
  }

  #[inline]
  fn pin_axis(&mut self, axis: usize, value: f32) {
    self.position[axis] = value;
  }
}

/// Spherical interpolation of unit vectors. Falls back to a normalized lerp
/// for nearly parallel inputs, and to `a` for opposite ones.
pub fn slerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
  let dot = a.dot(b).clamp(-1.0, 1.0);
  if dot > 0.9995 {
    return a.lerp(b, t).normalize_or(a);
  }
  let theta = dot.acos();
  let sin = theta.sin();
  if sin.abs() < 1e-6 {
    return a;
  }
  let wa = ((1.0 - t) * theta).sin() / sin;
  let wb = (t * theta).sin() / sin;
  (a * wa + b * wb).normalize_or(a)
}

type Polygon<V> = SmallVec<[V; 9]>;

/// Clip one convex polygon against `sign * (p[axis] - value) >= 0`.
fn clip_plane<V: ClipVertex>(
  input: &Polygon<V>,
  axis: usize,
  sign: f32,
  value: f32,
  output: &mut Polygon<V>,
) {
  output.clear();
  let n = input.len();
  for i in 0..n {
    let current = input[i];
    let next = input[(i + 1) % n];
    let dc = sign * (current.position()[axis] - value);
    let dn = sign * (next.position()[axis] - value);

    if dc >= 0.0 {
      output.push(current);
    }
    if (dc >= 0.0) != (dn >= 0.0) {
      let t = dc / (dc - dn);
      let mut vertex = current.interpolate(&next, t);
      vertex.pin_axis(axis, value);
      output.push(vertex);
    }
  }
}

/// Append the part of `mesh` inside `rect` to `out`.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "polygon::clip"))]
pub fn clip_to_rect<V: ClipVertex>(mesh: &MeshOutput<V>, rect: Aabb2, out: &mut MeshOutput<V>) {
  let planes = [
    (0, 1.0, rect.min.x),
    (0, -1.0, rect.max.x),
    (1, 1.0, rect.min.y),
    (1, -1.0, rect.max.y),
  ];
  let inside = |v: &V| {
    let p = v.position();
    p.x >= rect.min.x - INSIDE_EPSILON
      && p.x <= rect.max.x + INSIDE_EPSILON
      && p.y >= rect.min.y - INSIDE_EPSILON
      && p.y <= rect.max.y + INSIDE_EPSILON
  };

  let mut remap = vec![u32::MAX; mesh.vertices.len()];
  let mut polygon: Polygon<V> = SmallVec::new();
  let mut scratch: Polygon<V> = SmallVec::new();

  for tri in mesh.indices.chunks_exact(3) {
    let corners = [
      mesh.vertices[tri[0] as usize],
      mesh.vertices[tri[1] as usize],
      mesh.vertices[tri[2] as usize],
    ];

    if corners.iter().all(inside) {
      for &index in tri {
        let slot = &mut remap[index as usize];
        if *slot == u32::MAX {
          *slot = out.vertices.len() as u32;
          out.vertices.push(mesh.vertices[index as usize]);
        }
        out.indices.push(*slot);
      }
      continue;
    }

    polygon.clear();
    polygon.extend_from_slice(&corners);
    for &(axis, sign, value) in &planes {
      clip_plane(&polygon, axis, sign, value, &mut scratch);
      std::mem::swap(&mut polygon, &mut scratch);
      if polygon.len() < 3 {
        break;
      }
    }
    if polygon.len() < 3 {
      continue;
    }

    let base = out.vertices.len() as u32;
    let mut emitted = false;
    for k in 1..polygon.len() - 1 {
      let a = polygon[0].position();
      let b = polygon[k].position();
      let c = polygon[k + 1].position();
      if (b - a).cross(c - a).length_squared() <= SLIVER_AREA {
        continue;
      }
      emitted = true;
      out
        .indices
        .extend_from_slice(&[base, base + k as u32, base + k as u32 + 1]);
    }
    if emitted {
      out.vertices.extend_from_slice(&polygon);
    }
  }
  out.recompute_bounds();
}

#[cfg(test)]
#[path = "clip_test.rs"]
mod clip_test;
