use glam::{Vec2, Vec3};

use super::*;
use crate::types::{Aabb2, CollisionVertex, MeshOutput, Vertex};

fn vertex(x: f32, y: f32) -> Vertex {
  Vertex {
    position: [x, y, 0.0],
    ..Default::default()
  }
}

fn mesh(points: &[(f32, f32)], indices: &[u32]) -> MeshOutput {
  let mut mesh = MeshOutput::new();
  mesh.vertices = points.iter().map(|&(x, y)| vertex(x, y)).collect();
  mesh.indices = indices.to_vec();
  mesh.recompute_bounds();
  mesh
}

fn area<V: HasPosition>(mesh: &MeshOutput<V>) -> f32 {
  mesh
    .indices
    .chunks_exact(3)
    .map(|t| {
      let p = |i: u32| mesh.vertices[i as usize].position();
      (p(t[1]) - p(t[0])).cross(p(t[2]) - p(t[0])).length() * 0.5
    })
    .sum()
}

fn rect(min: f32, max: f32) -> Aabb2 {
  Aabb2::new(Vec2::splat(min), Vec2::splat(max))
}

#[test]
fn test_inside_triangles_keep_shared_vertices() {
  let quad = mesh(
    &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
    &[0, 1, 2, 0, 2, 3],
  );
  let mut out = MeshOutput::new();
  clip_to_rect(&quad, rect(-5.0, 5.0), &mut out);
  assert_eq!(out.vertices.len(), 4);
  assert_eq!(out.indices, quad.indices);
}

#[test]
fn test_outside_triangle_is_dropped() {
  let tri = mesh(&[(10.0, 10.0), (12.0, 10.0), (10.0, 12.0)], &[0, 1, 2]);
  let mut out = MeshOutput::new();
  clip_to_rect(&tri, rect(-5.0, 5.0), &mut out);
  assert!(out.is_empty());
  assert!(out.vertices.is_empty());
}

#[test]
fn test_straddling_triangle_is_cut() {
  let tri = mesh(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)], &[0, 1, 2]);
  let mut out = MeshOutput::new();
  clip_to_rect(&tri, Aabb2::new(Vec2::splat(-10.0), Vec2::new(2.0, 10.0)), &mut out);

  assert!((area(&out) - 6.0).abs() < 1e-4);
  assert!(out.vertices.iter().all(|v| v.position[0] <= 2.0));
  assert!(out.vertices.iter().any(|v| v.position[0] == 2.0));
  assert!(out.bounds.max[0] <= 2.0);
}

#[test]
fn test_triangle_larger_than_rect() {
  let tri = mesh(&[(-100.0, -100.0), (100.0, -100.0), (0.0, 100.0)], &[0, 1, 2]);
  let mut out = MeshOutput::new();
  clip_to_rect(&tri, rect(-1.0, 1.0), &mut out);
  assert!((area(&out) - 4.0).abs() < 1e-3);
  for v in &out.vertices {
    assert!(v.position[0].abs() <= 1.0 && v.position[1].abs() <= 1.0);
  }
}

#[test]
fn test_winding_is_preserved() {
  let tri = mesh(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)], &[0, 1, 2]);
  let mut out = MeshOutput::new();
  clip_to_rect(&tri, rect(1.0, 3.0), &mut out);
  assert!(!out.is_empty());
  for t in out.indices.chunks_exact(3) {
    let p = |i: u32| out.vertices[i as usize].position();
    assert!((p(t[1]) - p(t[0])).cross(p(t[2]) - p(t[0])).z > 0.0);
  }
}

#[test]
fn test_interpolated_normals_stay_unit() {
  let mut tri = mesh(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)], &[0, 1, 2]);
  tri.vertices[0].normal = [1.0, 0.0, 0.0];
  tri.vertices[1].normal = [0.0, 1.0, 0.0];
  tri.vertices[2].normal = [0.0, 0.0, 1.0];

  let mut out = MeshOutput::new();
  clip_to_rect(&tri, rect(0.5, 3.0), &mut out);
  for v in &out.vertices {
    assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-4);
  }
}

#[test]
fn test_collision_vertices_clip() {
  let mut tri: MeshOutput<CollisionVertex> = MeshOutput::new();
  tri.vertices = vec![
    CollisionVertex {
      position: [-4.0, 0.0, 1.0],
    },
    CollisionVertex {
      position: [4.0, 0.0, 1.0],
    },
    CollisionVertex {
      position: [0.0, 4.0, 3.0],
    },
  ];
  tri.indices = vec![0, 1, 2];

  let mut out = MeshOutput::new();
  clip_to_rect(&tri, Aabb2::new(Vec2::new(0.0, -10.0), Vec2::splat(10.0)), &mut out);
  assert!((area(&out) - area(&tri) * 0.5).abs() < 1e-3);
  assert!(out.vertices.iter().all(|v| v.position[0] >= 0.0));
}

#[test]
fn test_slerp_halfway() {
  let mid = slerp(Vec3::X, Vec3::Y, 0.5);
  let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
  assert!((mid - expected).length() < 1e-5);
  assert_eq!(slerp(Vec3::X, Vec3::X, 0.3), Vec3::X);
}
