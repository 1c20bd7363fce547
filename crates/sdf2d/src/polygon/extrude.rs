//! Prism extrusion with sharp, beveled or rounded cap edges.
//!
//! ```text
//!   side view of one wall (outside to the right)
//!
//!     z = +h  ──┐ back cap        Sharp   Bevel    Round
//!               │                   │       /        )
//!               │ wall              │      │        │
//!               │                   │       \        )
//!     z = -h  ──┘ front cap         │
//! ```
//!
//! The profile is built for the front half (front cap edge to mid-plane) and
//! mirrored for the back half. Caps are the contour inset by the edge radius
//! along each vertex miter, filled with the contour's own triangulation.
//!
//! Synthetic edges (see [`Contours::synthetic`]) close loops where the
//! sample grid ends. They are not part of the surface: they get no wall and
//! stay in place when the cap is inset, so a cap running off the chunk keeps
//! its full height up to the seam.
//!
//! Wall `u` is the distance travelled along the loop, `v` the distance along
//! the profile, both times `uv_scale`.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::contour::{Contours, EdgeLoop};
use crate::layer::EdgeStyle;
use crate::types::{MeshOutput, Vertex};

/// Miter scale limit at very sharp corners.
const MAX_MITER_SCALE: f32 = 4.0;

/// Extrusion parameters in chunk-local units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtrudeParams {
  pub half_depth: f32,
  pub z_offset: f32,
  pub edge_style: EdgeStyle,
  /// Degrees.
  pub max_smoothing_angle: f32,
  pub uv_scale: f32,
  /// World position of the chunk-local origin, for cap UVs.
  pub uv_origin: Vec2,
}

impl Default for ExtrudeParams {
  fn default() -> Self {
    Self {
      half_depth: 32.0,
      z_offset: 0.0,
      edge_style: EdgeStyle::Sharp,
      max_smoothing_angle: 40.0,
      uv_scale: 1.0,
      uv_origin: Vec2::ZERO,
    }
  }
}

/// One cross-section sample of the wall profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileRow {
  /// Distance inward from the contour.
  pub inset: f32,
  /// Height relative to the mid-plane.
  pub z: f32,
  /// Profile normal as (outward, z).
  pub normal: Vec2,
  /// Arc length from the front cap edge.
  pub v: f32,
}

/// Full wall profile from the front cap edge to the back cap edge.
///
/// Rows inside a strip share vertices; strips meet with a hard crease.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
  pub strips: Vec<Vec<ProfileRow>>,
  /// Inset of both caps.
  pub cap_inset: f32,
}

impl Profile {
  pub fn new(style: EdgeStyle, half_depth: f32) -> Self {
    let h = half_depth.max(0.0);
    let r = style.effective_radius(h);
    let wall_normal = Vec2::X;

    let mut front: Vec<Vec<ProfileRow>> = Vec::new();
    let row = |inset: f32, z: f32, normal: Vec2| ProfileRow {
      inset,
      z,
      normal,
      v: 0.0,
    };

    match style {
      EdgeStyle::Bevel { .. } if r > 0.0 => {
        let n = Vec2::new(1.0, -1.0).normalize();
        front.push(vec![row(r, -h, n), row(0.0, -h + r, n)]);
      }
      EdgeStyle::Round { faces, .. } if r > 0.0 => {
        let faces = faces.max(1);
        front.push(
          (0..=faces)
            .map(|k| {
              let theta = k as f32 / faces as f32 * FRAC_PI_2;
              let (sin, cos) = theta.sin_cos();
              row(r - r * sin, -h + r - r * cos, Vec2::new(sin, -cos))
            })
            .collect(),
        );
      }
      _ => {}
    }
    let cap_inset = if front.is_empty() { 0.0 } else { r };

    if h - r > f32::EPSILON || front.is_empty() {
      front.push(vec![row(0.0, -h + r, wall_normal), row(0.0, 0.0, wall_normal)]);
    }

    // Arc length.
    let mut v = 0.0;
    let mut last: Option<Vec2> = None;
    for strip in &mut front {
      for row in strip.iter_mut() {
        let point = Vec2::new(row.inset, row.z);
        if let Some(prev) = last {
          v += prev.distance(point);
        }
        row.v = v;
        last = Some(point);
      }
    }
    let half_length = v;

    let back: Vec<Vec<ProfileRow>> = front
      .iter()
      .rev()
      .map(|strip| {
        strip
          .iter()
          .rev()
          .map(|row| ProfileRow {
            inset: row.inset,
            z: -row.z,
            normal: Vec2::new(row.normal.x, -row.normal.y),
            v: 2.0 * half_length - row.v,
          })
          .collect()
      })
      .collect();

    let mut strips: Vec<Vec<ProfileRow>> = Vec::with_capacity(front.len() + back.len());
    for strip in front.into_iter().chain(back) {
      match strips.last_mut() {
        Some(prev) if prev.last().is_some_and(|row| same_row(row, &strip[0])) => {
          prev.extend_from_slice(&strip[1..]);
        }
        _ => strips.push(strip),
      }
    }

    Self { strips, cap_inset }
  }

  /// Total profile length, front cap edge to back cap edge.
  pub fn length(&self) -> f32 {
    self
      .strips
      .last()
      .and_then(|strip| strip.last())
      .map_or(0.0, |row| row.v)
  }
}

fn same_row(a: &ProfileRow, b: &ProfileRow) -> bool {
  a.inset == b.inset && a.z == b.z && a.normal == b.normal
}

/// One vertical column of wall vertices.
#[derive(Clone, Copy, Debug)]
struct Column {
  position: Vec2,
  /// Inward offset per unit of inset is `-offset`.
  offset: Vec2,
  normal: Vec2,
  tangent: Vec2,
  u: f32,
}

#[inline]
fn edge_normal(direction: Vec2) -> Vec2 {
  Vec2::new(direction.y, -direction.x)
}

/// Miter offset at vertex `i`: moving a point by `offset * d` moves both
/// adjacent edges outward by `d`.
fn miter_offset(n_in: Vec2, n_out: Vec2) -> Vec2 {
  let m = (n_in + n_out).normalize_or_zero();
  if m == Vec2::ZERO {
    return n_out;
  }
  let scale = 1.0 / m.dot(n_out).max(1.0 / MAX_MITER_SCALE);
  m * scale
}

/// Outward offset per unit of inset at a vertex, given which adjacent edges
/// are inset. Next to a held edge the vertex follows the inset edge's normal.
fn vertex_offset(n_in: Vec2, n_out: Vec2, in_moves: bool, out_moves: bool) -> Vec2 {
  match (in_moves, out_moves) {
    (true, true) => miter_offset(n_in, n_out),
    (true, false) => n_in,
    (false, true) => n_out,
    (false, false) => Vec2::ZERO,
  }
}

/// Edge `i` runs from vertex `i` to `i + 1` and is synthetic if either end is.
#[inline]
fn edge_is_synthetic(synthetic: &[bool], i: usize) -> bool {
  let n = synthetic.len();
  n > 0 && (synthetic[i % n] || synthetic[(i + 1) % n])
}

/// Inset copy of one loop's points, written into `out[range]`.
fn inset_loop(points: &[Vec2], synthetic: &[bool], inset: f32, out: &mut [Vec2]) {
  let n = points.len();
  for i in 0..n {
    let prev = points[(i + n - 1) % n];
    let here = points[i];
    let next = points[(i + 1) % n];
    let n_in = edge_normal((here - prev).normalize_or_zero());
    let n_out = edge_normal((next - here).normalize_or_zero());
    let offset = vertex_offset(
      n_in,
      n_out,
      !edge_is_synthetic(synthetic, i + n - 1),
      !edge_is_synthetic(synthetic, i),
    );
    out[i] = here - offset * inset;
  }
}

/// Columns of one loop plus the `(start, end)` column pair of each real edge.
///
/// Vertex 0 gets a separate closing column with `u` equal to the perimeter.
fn loop_columns(
  points: &[Vec2],
  synthetic: &[bool],
  smooth_cos: f32,
  columns: &mut Vec<Column>,
  edges: &mut Vec<(usize, usize)>,
) {
  columns.clear();
  edges.clear();
  let n = points.len();
  let direction = |i: usize| (points[(i + 1) % n] - points[i]).normalize_or_zero();

  let mut u = 0.0;
  let mut pending_start = 0;
  for i in 0..=n {
    let vi = i % n;
    let d_in = direction((vi + n - 1) % n);
    let d_out = direction(vi);
    let n_in = edge_normal(d_in);
    let n_out = edge_normal(d_out);
    let in_real = !edge_is_synthetic(synthetic, vi + n - 1);
    let out_real = !edge_is_synthetic(synthetic, vi);
    let offset = vertex_offset(n_in, n_out, in_real, out_real);
    let position = points[vi];
    let column = |normal: Vec2, tangent: Vec2| Column {
      position,
      offset,
      normal,
      tangent,
      u,
    };

    let (end, start) = if in_real == out_real && n_in.dot(n_out) >= smooth_cos {
      columns.push(column(
        (n_in + n_out).normalize_or(n_out),
        (d_in + d_out).normalize_or(d_out),
      ));
      (columns.len() - 1, columns.len() - 1)
    } else if i == n {
      columns.push(column(n_in, d_in));
      (columns.len() - 1, usize::MAX)
    } else {
      columns.push(column(n_in, d_in));
      columns.push(column(n_out, d_out));
      (columns.len() - 2, columns.len() - 1)
    };

    if i > 0 && in_real {
      edges.push((pending_start, end));
    }
    if i < n {
      pending_start = start;
      u += points[(vi + 1) % n].distance(position);
    }
  }
}

/// Extrude `contours` into front cap, back cap and wall streams.
///
/// `fill` holds counter-clockwise triangles over `contours.vertices`.
pub fn extrude(
  contours: &Contours,
  fill: &[u32],
  profile: &Profile,
  params: &ExtrudeParams,
  front: &mut MeshOutput,
  back: &mut MeshOutput,
  cut: &mut MeshOutput,
) {
  let h = params.half_depth;
  let z_front = params.z_offset - h;
  let z_back = params.z_offset + h;

  // Caps.
  let mut cap_points = vec![Vec2::ZERO; contours.vertices.len()];
  for edge_loop in &contours.loops {
    inset_loop(
      contours.loop_points(edge_loop),
      contours.loop_synthetic(edge_loop),
      profile.cap_inset,
      &mut cap_points[edge_loop.range()],
    );
  }
  write_cap(&cap_points, fill, z_front, -1.0, params, front);
  write_cap(&cap_points, fill, z_back, 1.0, params, back);

  // Walls.
  let smooth_cos = params.max_smoothing_angle.to_radians().cos();
  let mut columns = Vec::new();
  let mut edges = Vec::new();
  for edge_loop in &contours.loops {
    write_wall(
      contours,
      edge_loop,
      profile,
      params,
      smooth_cos,
      &mut columns,
      &mut edges,
      cut,
    );
  }
}

fn write_cap(
  points: &[Vec2],
  fill: &[u32],
  z: f32,
  facing: f32,
  params: &ExtrudeParams,
  out: &mut MeshOutput,
) {
  let base = out.vertices.len() as u32;
  let normal = [0.0, 0.0, facing];
  for &p in points {
    let uv = (params.uv_origin + p) * params.uv_scale;
    out.vertices.push(Vertex {
      position: [p.x, p.y, z],
      normal,
      tangent: [1.0, 0.0, 0.0, facing],
      uv: uv.to_array(),
    });
  }
  for tri in fill.chunks_exact(3) {
    let (a, b, c) = (tri[0] + base, tri[1] + base, tri[2] + base);
    if facing < 0.0 {
      out.indices.extend_from_slice(&[a, c, b]);
    } else {
      out.indices.extend_from_slice(&[a, b, c]);
    }
  }
}

#[allow(clippy::too_many_arguments)]
fn write_wall(
  contours: &Contours,
  edge_loop: &EdgeLoop,
  profile: &Profile,
  params: &ExtrudeParams,
  smooth_cos: f32,
  columns: &mut Vec<Column>,
  edges: &mut Vec<(usize, usize)>,
  out: &mut MeshOutput,
) {
  let points = contours.loop_points(edge_loop);
  loop_columns(
    points,
    contours.loop_synthetic(edge_loop),
    smooth_cos,
    columns,
    edges,
  );
  if edges.is_empty() {
    return;
  }

  for strip in &profile.strips {
    let rows = strip.len();
    if rows < 2 {
      continue;
    }
    let base = out.vertices.len() as u32;
    for column in columns.iter() {
      for row in strip {
        let position = column.position - column.offset * row.inset;
        let normal = Vec3::new(
          column.normal.x * row.normal.x,
          column.normal.y * row.normal.x,
          row.normal.y,
        )
        .normalize_or(Vec3::Z);
        out.vertices.push(Vertex {
          position: [position.x, position.y, params.z_offset + row.z],
          normal: normal.to_array(),
          tangent: [column.tangent.x, column.tangent.y, 0.0, 1.0],
          uv: [column.u * params.uv_scale, row.v * params.uv_scale],
        });
      }
    }

    let rows = rows as u32;
    for &(start, end) in edges.iter() {
      let (c0, c1) = (start as u32, end as u32);
      for r in 0..rows - 1 {
        let a = base + c0 * rows + r;
        let b = base + c1 * rows + r;
        let c = base + c1 * rows + r + 1;
        let d = base + c0 * rows + r + 1;
        out.indices.extend_from_slice(&[a, b, c, a, c, d]);
      }
    }
  }
}

#[cfg(test)]
#[path = "extrude_test.rs"]
mod extrude_test;
