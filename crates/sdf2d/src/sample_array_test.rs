use std::sync::Arc;

use glam::Vec2;

use super::*;
use crate::constants::SURFACE;
use crate::quality::QualityPreset;
use crate::shapes::{CircleSdf, RectSdf};

fn medium() -> SampleArray {
  SampleArray::new(QualityPreset::Medium.quality())
}

#[test]
fn test_new_array_is_empty() {
  let array = medium();
  assert_eq!(array.side(), 35);
  assert_eq!(array.front().len(), 35 * 35);
  assert!(array.is_empty());
}

#[test]
fn test_sample_positions_are_centered() {
  let array = medium();
  // Sample APRON sits on the chunk's min edge, APRON + resolution on the max.
  assert_eq!(array.sample_position(1, 1), Vec2::splat(-128.0));
  assert_eq!(array.sample_position(33, 33), Vec2::splat(128.0));
  assert_eq!(array.sample_position(17, 1), Vec2::new(0.0, -128.0));
  assert_eq!(array.sample_position(0, 0), Vec2::splat(-136.0));
}

#[test]
fn test_add_marks_inside_samples() {
  let mut array = medium();
  assert!(array.add(&CircleSdf::new(Vec2::ZERO, 50.0)));

  // Centre sample at index 17: deep inside.
  assert_eq!(array.sample(17, 17), 0);
  assert!((array.sample(17, 17) as f32) < SURFACE);
  // Chunk corner: far outside.
  assert_eq!(array.sample(1, 1), FAR_OUTSIDE);
  assert!(!array.is_empty());
}

#[test]
fn test_add_is_idempotent() {
  let mut array = medium();
  let circle = CircleSdf::new(Vec2::new(10.0, -20.0), 40.0);
  assert!(array.add(&circle));
  let first = array.snapshot();

  assert!(!array.add(&circle));
  assert_eq!(array.front(), first.as_slice());
}

#[test]
fn test_subtract_is_idempotent() {
  let mut array = medium();
  array.add(&RectSdf::new(Vec2::splat(-100.0), Vec2::splat(100.0)));
  let hole = CircleSdf::new(Vec2::ZERO, 30.0);

  assert!(array.subtract(&hole));
  assert!(!array.subtract(&hole));
}

#[test]
fn test_subtract_on_empty_array_changes_nothing() {
  let mut array = medium();
  assert!(!array.subtract(&CircleSdf::new(Vec2::ZERO, 60.0)));
  assert!(array.is_empty());
}

#[test]
fn test_add_then_subtract_empties_region() {
  let mut array = medium();
  let circle = CircleSdf::new(Vec2::ZERO, 50.0);
  array.add(&circle);
  array.subtract(&circle);

  for y in 0..array.side() {
    for x in 0..array.side() {
      assert!(
        array.sample(x as i32, y as i32) as f32 > SURFACE,
        "sample ({x}, {y}) still solid"
      );
    }
  }
}

#[test]
fn test_far_shape_does_not_touch_samples() {
  let mut array = medium();
  // Chunk spans [-128, 128]; the influence margin is 32 + 8.
  let far = CircleSdf::new(Vec2::new(400.0, 0.0), 50.0);
  assert!(!array.add(&far));
  assert!(array.is_empty());
}

#[test]
fn test_samples_outside_grown_bounds_are_unchanged() {
  let mut array = medium();
  let circle = CircleSdf::new(Vec2::new(-60.0, 30.0), 20.0);
  array.add(&circle);

  let quality = *array.quality();
  let grown = circle.bounds().grow(quality.max_distance);
  for y in 0..array.side() {
    for x in 0..array.side() {
      if !grown.contains_point(array.sample_position(x, y)) {
        assert_eq!(array.sample(x as i32, y as i32), FAR_OUTSIDE);
      }
    }
  }
}

#[test]
fn test_snapshot_survives_mutation() {
  let mut array = medium();
  array.add(&CircleSdf::new(Vec2::ZERO, 20.0));
  let snapshot = array.snapshot();
  let copy = snapshot.as_ref().clone();

  // Two more mutations cycle through both buffers.
  array.add(&CircleSdf::new(Vec2::new(60.0, 0.0), 20.0));
  array.add(&CircleSdf::new(Vec2::new(-60.0, 0.0), 20.0));

  assert_eq!(snapshot.as_ref(), &copy);
  assert_ne!(array.front(), copy.as_slice());
}

#[test]
fn test_rebuild_matches_sequential_application() {
  let quality = QualityPreset::High.quality();
  let modifications = vec![
    Modification::add(Arc::new(RectSdf::new(Vec2::splat(-90.0), Vec2::new(40.0, 70.0)))),
    Modification::subtract(Arc::new(CircleSdf::new(Vec2::new(10.0, 10.0), 25.0))),
    Modification::add(Arc::new(CircleSdf::new(Vec2::new(80.0, -80.0), 35.0))),
  ];

  let mut sequential = SampleArray::new(quality);
  for modification in &modifications {
    match modification.op {
      Op::Add => sequential.add(modification.shape.as_ref()),
      Op::Subtract => sequential.subtract(modification.shape.as_ref()),
    };
  }

  let mut rebuilt = SampleArray::new(quality);
  rebuilt.add(&CircleSdf::new(Vec2::new(-100.0, 100.0), 10.0));
  assert!(rebuilt.rebuild(&modifications));
  assert_eq!(rebuilt.front(), sequential.front());

  assert!(!rebuilt.rebuild(&modifications));
}

#[test]
fn test_lookup_off_grid_is_far_outside() {
  let samples = vec![0u8; 9];
  assert_eq!(lookup(&samples, 3, -1, 0), FAR_OUTSIDE);
  assert_eq!(lookup(&samples, 3, 0, 3), FAR_OUTSIDE);
  assert_eq!(lookup(&samples, 3, 2, 2), 0);
}

#[test]
fn test_op_bytes() {
  assert_eq!(Op::from_byte(Op::Add.to_byte()), Some(Op::Add));
  assert_eq!(Op::from_byte(Op::Subtract.to_byte()), Some(Op::Subtract));
  assert_eq!(Op::from_byte(7), None);
}
