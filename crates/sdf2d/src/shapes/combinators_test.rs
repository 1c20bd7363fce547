use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec2;

use super::*;

const EPS: f32 = 1e-4;

fn unit_circle() -> ShapeRef {
  Arc::new(CircleSdf::new(Vec2::ZERO, 1.0))
}

#[test]
fn test_translate_moves_field_and_bounds() {
  let shape = Translate::new(unit_circle(), Vec2::new(10.0, -2.0));

  assert!((shape.distance(Vec2::new(10.0, -2.0)) + 1.0).abs() < EPS);
  assert!(shape.distance(Vec2::new(11.0, -2.0)).abs() < EPS);

  let bounds = shape.bounds();
  assert_eq!(bounds.min, Vec2::new(9.0, -3.0));
  assert_eq!(bounds.max, Vec2::new(11.0, -1.0));
}

#[test]
fn test_transform_scales_distance() {
  let shape = Transform::new(unit_circle(), Vec2::new(5.0, 0.0), 0.0, 4.0);

  // Radius 4 after scaling, and distances stay in world units.
  assert!(shape.distance(Vec2::new(9.0, 0.0)).abs() < EPS);
  assert!((shape.distance(Vec2::new(5.0, 0.0)) + 4.0).abs() < EPS);
  assert!((shape.distance(Vec2::new(15.0, 0.0)) - 6.0).abs() < EPS);
}

#[test]
fn test_transform_rotation() {
  let rect: ShapeRef = Arc::new(RectSdf::new(Vec2::new(0.0, -1.0), Vec2::new(10.0, 1.0)));
  let shape = Transform::new(rect, Vec2::ZERO, FRAC_PI_2, 1.0);

  // The bar now points up the Y axis.
  assert!(shape.distance(Vec2::new(0.0, 5.0)) < 0.0);
  assert!(shape.distance(Vec2::new(5.0, 0.0)) > 0.0);

  let bounds = shape.bounds();
  assert!((bounds.min - Vec2::new(-1.0, 0.0)).length() < EPS);
  assert!((bounds.max - Vec2::new(1.0, 10.0)).length() < EPS);
}

#[test]
fn test_transform_round_trips_points() {
  let shape = Transform::new(unit_circle(), Vec2::new(3.0, -7.0), 0.7, 2.5);
  let local = Vec2::new(0.3, -0.9);
  let back = shape.to_local(shape.to_world(local));
  assert!((back - local).length() < EPS);
}

#[test]
fn test_transform_rejects_bad_scale() {
  for scale in [0.0, -2.0, f32::NAN, f32::INFINITY] {
    let result = Transform::try_new(unit_circle(), Vec2::ZERO, 0.0, scale);
    assert!(matches!(result, Err(ShapeError::InvalidData(_))), "{scale}");
  }
  let shape = Transform::try_new(unit_circle(), Vec2::ZERO, 0.0, 0.5).unwrap();
  assert_eq!(shape.scale, 0.5);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "transform scale must be positive")]
fn test_transform_new_asserts_scale() {
  let _ = Transform::new(unit_circle(), Vec2::ZERO, 0.0, 0.0);
}

#[test]
fn test_expand_dilates() {
  let shape = Expand::new(unit_circle(), 2.0);

  assert!(shape.distance(Vec2::new(3.0, 0.0)).abs() < EPS);
  assert_eq!(shape.bounds().max, Vec2::splat(3.0));
}

#[test]
fn test_nested_wrappers() {
  let inner: ShapeRef = Arc::new(Expand::new(unit_circle(), 1.0));
  let shape = Translate::new(inner, Vec2::new(100.0, 100.0));

  assert!(shape.distance(Vec2::new(102.0, 100.0)).abs() < EPS);
  assert!(shape.bounds().contains_point(Vec2::new(101.5, 100.0)));
}
