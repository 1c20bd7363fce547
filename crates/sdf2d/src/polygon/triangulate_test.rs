use glam::Vec2;

use super::*;
use crate::contour::{trace, Contours};
use crate::quality::QualityPreset;
use crate::sample_array::SampleArray;
use crate::shapes::{CircleSdf, RectSdf};

fn square(min: f32, max: f32) -> Vec<Vec2> {
  vec![
    Vec2::new(min, min),
    Vec2::new(max, min),
    Vec2::new(max, max),
    Vec2::new(min, max),
  ]
}

fn hole(min: f32, max: f32) -> Vec<Vec2> {
  let mut points = square(min, max);
  points.reverse();
  points
}

/// Sum of signed triangle areas.
fn covered_area(points: &[Vec2], triangles: &[u32]) -> f32 {
  triangles
    .chunks_exact(3)
    .map(|t| {
      let (a, b, c) = (points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]);
      (b - a).perp_dot(c - a) * 0.5
    })
    .sum()
}

fn all_ccw(points: &[Vec2], triangles: &[u32]) -> bool {
  triangles.chunks_exact(3).all(|t| {
    let (a, b, c) = (points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]);
    (b - a).perp_dot(c - a) > 0.0
  })
}

#[test]
fn test_square() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 4.0));

  let mut triangles = Vec::new();
  Triangulator::new()
    .triangulate(&contours, &mut triangles)
    .unwrap();
  assert_eq!(triangles.len(), 6);
  assert!((covered_area(&contours.vertices, &triangles) - 16.0).abs() < 1e-4);
  assert!(all_ccw(&contours.vertices, &triangles));
}

#[test]
fn test_concave_polygon() {
  // L shape.
  let mut contours = Contours::new();
  contours.push_loop(&[
    Vec2::new(0.0, 0.0),
    Vec2::new(6.0, 0.0),
    Vec2::new(6.0, 2.0),
    Vec2::new(2.0, 2.0),
    Vec2::new(2.0, 6.0),
    Vec2::new(0.0, 6.0),
  ]);

  let mut triangles = Vec::new();
  Triangulator::new()
    .triangulate(&contours, &mut triangles)
    .unwrap();
  assert_eq!(triangles.len() / 3, 4);
  assert!((covered_area(&contours.vertices, &triangles) - 20.0).abs() < 1e-4);
  assert!(all_ccw(&contours.vertices, &triangles));
}

#[test]
fn test_collinear_vertex_is_tolerated() {
  let mut contours = Contours::new();
  contours.push_loop(&[
    Vec2::new(0.0, 0.0),
    Vec2::new(5.0, 0.0),
    Vec2::new(10.0, 0.0),
    Vec2::new(10.0, 10.0),
    Vec2::new(0.0, 10.0),
  ]);

  let mut triangles = Vec::new();
  Triangulator::new()
    .triangulate(&contours, &mut triangles)
    .unwrap();
  assert!((covered_area(&contours.vertices, &triangles) - 100.0).abs() < 1e-3);
}

#[test]
fn test_square_with_hole() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 10.0));
  contours.push_loop(&hole(3.0, 7.0));

  let mut triangulator = Triangulator::new();
  let mut triangles = Vec::new();
  triangulator.triangulate(&contours, &mut triangles).unwrap();

  assert_eq!(
    triangulator.groups(),
    &[PolygonGroup {
      outer: 0,
      holes: vec![1]
    }]
  );
  assert!((covered_area(&contours.vertices, &triangles) - 84.0).abs() < 1e-3);
  assert!(all_ccw(&contours.vertices, &triangles));
}

#[test]
fn test_two_holes() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 20.0));
  contours.push_loop(&hole(2.0, 6.0));
  contours.push_loop(&[
    Vec2::new(16.0, 12.0),
    Vec2::new(12.0, 12.0),
    Vec2::new(12.0, 16.0),
    Vec2::new(16.0, 16.0),
  ]);
  assert!(contours.loops[2].is_hole());

  let mut triangles = Vec::new();
  Triangulator::new()
    .triangulate(&contours, &mut triangles)
    .unwrap();
  assert!((covered_area(&contours.vertices, &triangles) - (400.0 - 32.0)).abs() < 1e-2);
}

#[test]
fn test_island_inside_hole_gets_own_group() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 30.0));
  contours.push_loop(&hole(5.0, 25.0));
  contours.push_loop(&square(10.0, 20.0));

  let mut triangulator = Triangulator::new();
  let mut triangles = Vec::new();
  triangulator.triangulate(&contours, &mut triangles).unwrap();

  assert_eq!(triangulator.groups().len(), 2);
  assert_eq!(triangulator.groups()[0].holes, vec![1]);
  assert!(triangulator.groups()[1].holes.is_empty());
  let expected = 900.0 - 400.0 + 100.0;
  assert!((covered_area(&contours.vertices, &triangles) - expected).abs() < 1e-2);
}

#[test]
fn test_hole_goes_to_smallest_container() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 100.0));
  contours.push_loop(&hole(10.0, 90.0));
  contours.push_loop(&square(20.0, 80.0));
  contours.push_loop(&hole(40.0, 60.0));

  let mut triangulator = Triangulator::new();
  let mut triangles = Vec::new();
  triangulator.triangulate(&contours, &mut triangles).unwrap();

  let groups = triangulator.groups();
  assert_eq!(groups[0].holes, vec![1]);
  assert_eq!(groups[1].outer, 2);
  assert_eq!(groups[1].holes, vec![3]);
}

#[test]
fn test_orphan_hole_is_an_error() {
  let mut contours = Contours::new();
  contours.push_loop(&hole(0.0, 4.0));

  let mut triangles = Vec::new();
  let result = Triangulator::new().triangulate(&contours, &mut triangles);
  assert_eq!(result, Err(MeshError::OrphanHole { index: 0 }));
}

#[test]
fn test_non_finite_vertex_is_an_error() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 4.0));
  contours.vertices[2] = Vec2::new(f32::NAN, 4.0);

  let mut triangles = Vec::new();
  let result = Triangulator::new().triangulate(&contours, &mut triangles);
  assert_eq!(result, Err(MeshError::NonFinite { index: 0 }));
}

#[test]
fn test_traced_ring() {
  let quality = QualityPreset::High.quality();
  let mut array = SampleArray::new(quality);
  array.add(&CircleSdf::new(Vec2::ZERO, 90.0));
  array.subtract(&CircleSdf::new(Vec2::new(10.0, -5.0), 35.0));
  array.subtract(&RectSdf::new(Vec2::new(-70.0, -10.0), Vec2::new(-50.0, 10.0)));

  let contours = trace(array.front(), &quality);
  assert_eq!(contours.holes().count(), 2);

  let mut triangles = Vec::new();
  Triangulator::new()
    .triangulate(&contours, &mut triangles)
    .unwrap();

  let expected: f32 = contours.loops.iter().map(|l| l.area).sum();
  let covered = covered_area(&contours.vertices, &triangles);
  assert!((covered - expected).abs() / expected < 1e-3);
}

#[test]
fn test_reuse_after_reset() {
  let mut contours = Contours::new();
  contours.push_loop(&square(0.0, 4.0));

  let mut triangulator = Triangulator::new();
  let mut first = Vec::new();
  triangulator.triangulate(&contours, &mut first).unwrap();
  let mut second = Vec::new();
  triangulator.triangulate(&contours, &mut second).unwrap();
  assert_eq!(first, second);
  assert_eq!(triangulator.groups().len(), 1);
}
