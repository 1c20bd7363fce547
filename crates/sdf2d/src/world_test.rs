use std::sync::Arc;
use std::time::Duration;

use glam::{IVec2, Vec2, Vec3};

use super::*;
use crate::quality::QualityPreset;
use crate::shapes::{CircleSdf, RectSdf};

const FLUSH: Duration = Duration::from_secs(30);

fn circle(center: Vec2, radius: f32) -> ShapeRef {
  Arc::new(CircleSdf::new(center, radius))
}

fn world_with_layer(config: LayerConfig) -> (World, LayerId) {
  let mut world = World::new(WorldConfig::default());
  let layer = world.add_layer(config);
  (world, layer)
}

#[test]
fn test_chunk_range_single_chunk() {
  let quality = QualityPreset::Medium.quality();
  let bounds = Aabb2::from_center_half_extents(Vec2::ZERO, Vec2::splat(40.0));
  let range = chunk_range(bounds, &quality);
  assert_eq!(range.min, IVec2::new(0, 0));
  assert_eq!(range.max, IVec2::new(1, 1));
}

#[test]
fn test_chunk_range_straddles_seam() {
  let quality = QualityPreset::Medium.quality();
  let bounds = Aabb2::from_center_half_extents(Vec2::new(128.0, 0.0), Vec2::splat(10.0));
  let range = chunk_range(bounds, &quality);
  assert_eq!(range.min, IVec2::new(0, 0));
  assert_eq!(range.max, IVec2::new(2, 1));
}

#[test]
fn test_chunk_range_matches_intersects() {
  let quality = QualityPreset::Low.quality();
  let cases = [
    Aabb2::new(Vec2::new(-300.0, -20.0), Vec2::new(15.0, 700.0)),
    Aabb2::new(Vec2::new(127.0, 127.0), Vec2::new(129.0, 129.0)),
    Aabb2::new(Vec2::new(-1000.5, 33.3), Vec2::new(-999.5, 34.0)),
    Aabb2::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0)),
  ];
  for bounds in cases {
    let range = chunk_range(bounds, &quality);
    for y in -8..=8 {
      for x in -8..=8 {
        let coord = ChunkCoord::new(x, y);
        assert_eq!(
          range.contains(coord),
          chunk_intersects(coord, bounds, &quality),
          "{bounds:?} at {coord:?}"
        );
      }
    }
  }
}

#[test]
fn test_non_finite_bounds_affect_nothing() {
  let quality = QualityPreset::Medium.quality();
  let bounds = Aabb2::new(Vec2::splat(f32::NEG_INFINITY), Vec2::splat(f32::INFINITY));
  assert!(chunk_range(bounds, &quality).is_empty());
  assert!(!chunk_intersects(ChunkCoord::new(0, 0), bounds, &quality));
  assert!(chunk_range(Aabb2::empty(), &quality).is_empty());
}

#[test]
fn test_huge_finite_bounds_clamp_range() {
  let quality = QualityPreset::Medium.quality();
  let ground = Aabb2::new(Vec2::ZERO, Vec2::splat(1e12));
  let range = chunk_range(ground, &quality);
  assert!(!range.is_empty());
  for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(4000, 17), ChunkCoord::new(1, 1)] {
    assert!(range.contains(coord), "{coord:?}");
    assert!(chunk_intersects(coord, ground, &quality));
  }
  assert!(!range.contains(ChunkCoord::new(-1, 0)));

  let mirrored = Aabb2::new(Vec2::splat(-1e12), Vec2::ZERO);
  let range = chunk_range(mirrored, &quality);
  assert!(range.contains(ChunkCoord::new(0, 0)));
  assert!(range.contains(ChunkCoord::new(-90_000, -3)));

  // Past the coordinate limit nothing is addressable.
  let far = Aabb2::new(Vec2::splat(1e12), Vec2::splat(1e12 + 10.0));
  assert!(chunk_range(far, &quality).is_empty());
}

#[test]
fn test_add_then_flush_uploads_meshes() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  assert_eq!(world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap(), 1);
  assert_eq!(world.chunk_count(), 1);
  assert!(!world.is_idle());
  assert!(world.flush(FLUSH));

  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  let resources = chunk.resources();
  let front = resources.front.as_ref().unwrap();
  assert!(front.triangle_count() > 0);
  assert!(resources.back.is_none());
  assert!(resources.cut.is_none());
  assert!(resources.collision.is_none());

  // Cap bounds follow the circle within one grid unit.
  let unit = chunk.quality().unit_size;
  for axis in 0..2 {
    assert!((front.bounds.min[axis] + 50.0).abs() <= unit);
    assert!((front.bounds.max[axis] - 50.0).abs() <= unit);
  }

  let texture = resources.texture.as_ref().unwrap();
  assert_eq!(texture.texels, chunk.samples().front());
}

#[test]
fn test_seam_shape_meshes_both_chunks() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::new(128.0, 0.0), 30.0)).unwrap();
  assert_eq!(
    world.chunks(layer).unwrap().coords(),
    vec![ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]
  );
  assert!(world.flush(FLUSH));

  for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)] {
    let chunk = world.chunk(layer, coord).unwrap();
    let front = chunk.resources().front.as_ref().unwrap();
    assert!(front.triangle_count() > 0);
    let bounds = coord.bounds(256.0);
    for vertex in &front.vertices {
      assert!(vertex.position[0] >= bounds.min.x - 1e-3);
      assert!(vertex.position[0] <= bounds.max.x + 1e-3);
    }
  }
}

#[test]
fn test_collision_requires_physics() {
  let config = LayerConfig::default().with_collision(true);

  let mut world = World::new(WorldConfig::default().with_physics(false));
  let layer = world.add_layer(config.clone());
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert!(world.flush(FLUSH));
  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert!(chunk.resources().collision.is_none());

  let mut world = World::new(WorldConfig::default());
  let layer = world.add_layer(config);
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert!(world.flush(FLUSH));
  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert!(chunk.resources().collision.as_ref().unwrap().triangle_count() > 0);
}

#[test]
fn test_world_scale_applies_to_meshes() {
  let mut world = World::new(WorldConfig::default().with_scale(Vec3::new(2.0, 2.0, 1.0)));
  let layer = world.add_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert!(world.flush(FLUSH));

  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  let front = chunk.resources().front.as_ref().unwrap();
  assert!((front.bounds.max[0] - 100.0).abs() <= 2.0 * chunk.quality().unit_size);
}

#[test]
fn test_layer_without_outputs_only_uploads_texture() {
  let config = LayerConfig::default().with_material(None);
  let (mut world, layer) = world_with_layer(config);
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();

  let stats = world.tick();
  assert_eq!(stats.scheduled, 0);
  assert_eq!(stats.skipped, 1);
  assert_eq!(stats.textures_uploaded, 1);
  assert!(world.is_idle());

  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert!(chunk.resources().front.is_none());
  assert!(chunk.resources().texture.is_some());
}

#[test]
fn test_subtract_never_creates_chunks() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  assert_eq!(world.subtract(layer, circle(Vec2::new(900.0, 900.0), 40.0)).unwrap(), 0);
  assert_eq!(world.chunk_count(), 0);
  assert_eq!(world.history(layer).unwrap().len(), 1);
}

#[test]
fn test_subtract_removes_emptied_chunk() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 40.0)).unwrap();
  assert_eq!(world.chunk_count(), 1);

  let eraser: ShapeRef = Arc::new(RectSdf::new(Vec2::splat(-1000.0), Vec2::splat(1000.0)));
  assert_eq!(world.subtract(layer, eraser).unwrap(), 1);
  assert_eq!(world.chunk_count(), 0);
}

#[test]
fn test_subtract_keeps_partially_cut_chunk() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 60.0)).unwrap();
  world.subtract(layer, circle(Vec2::new(40.0, 0.0), 30.0)).unwrap();
  assert_eq!(world.chunk_count(), 1);
  assert!(world.flush(FLUSH));
  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert!(chunk.resources().front.as_ref().unwrap().triangle_count() > 0);
}

#[test]
fn test_unknown_layer() {
  let mut world = World::new(WorldConfig::default());
  let missing = LayerId(3);
  assert!(matches!(
    world.add(missing, circle(Vec2::ZERO, 10.0)),
    Err(WorldError::UnknownLayer(3))
  ));
  assert!(world.layer_config(missing).is_err());
  assert!(world.rebuild_layer(missing).is_err());
  assert!(world.chunk(missing, ChunkCoord::new(0, 0)).is_none());
}

#[test]
fn test_history_round_trip() {
  let registry = ShapeRegistry::new();
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::new(100.0, 20.0), 70.0)).unwrap();
  world.subtract(layer, circle(Vec2::new(130.0, 20.0), 25.0)).unwrap();
  world
    .add(layer, Arc::new(RectSdf::new(Vec2::new(-300.0, -40.0), Vec2::new(-200.0, 40.0))))
    .unwrap();
  let bytes = world.save_history(layer, &registry).unwrap();

  let (mut loaded, loaded_layer) = world_with_layer(LayerConfig::default());
  loaded.add(loaded_layer, circle(Vec2::new(2000.0, 0.0), 10.0)).unwrap();
  assert_eq!(loaded.load_history(loaded_layer, &bytes, &registry).unwrap(), 3);

  let coords = world.chunks(layer).unwrap().coords();
  assert_eq!(loaded.chunks(loaded_layer).unwrap().coords(), coords);
  for coord in coords {
    assert_eq!(
      world.chunk(layer, coord).unwrap().samples().front(),
      loaded.chunk(loaded_layer, coord).unwrap().samples().front()
    );
  }
  assert_eq!(loaded.history(loaded_layer).unwrap().len(), 3);
}

#[test]
fn test_bad_history_leaves_layer_alone() {
  let registry = ShapeRegistry::new();
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 30.0)).unwrap();
  let mut bytes = world.save_history(layer, &registry).unwrap();

  let mut trailing = bytes.clone();
  trailing.push(0);
  assert!(matches!(
    world.load_history(layer, &trailing, &registry),
    Err(WorldError::Shape(ShapeError::InvalidData(_)))
  ));

  // Op byte of the first modification.
  bytes[4] = 9;
  assert!(matches!(
    world.load_history(layer, &bytes, &registry),
    Err(WorldError::Shape(ShapeError::InvalidData(_)))
  ));

  assert!(world.load_history(layer, &bytes[..6], &registry).is_err());
  assert_eq!(world.history(layer).unwrap().len(), 1);
  assert_eq!(world.chunk_count(), 1);
}

#[test]
fn test_rebuild_layer_same_quality_is_stable() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::new(128.0, 128.0), 50.0)).unwrap();
  world.subtract(layer, circle(Vec2::new(128.0, 128.0), 20.0)).unwrap();
  let before = world.chunk_count();
  assert_eq!(world.rebuild_layer(layer).unwrap(), 0);
  assert_eq!(world.chunk_count(), before);
}

#[test]
fn test_rebuild_layer_at_new_quality() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert!(world.flush(FLUSH));

  let low = QualityPreset::Low.quality();
  world.layer_config_mut(layer).unwrap().quality = low;
  assert_eq!(world.layer_quality(layer).unwrap(), QualityPreset::Medium.quality());

  // Low reaches further, so neighbours pick up the circle too.
  let count = world.rebuild_layer(layer).unwrap();
  assert_eq!(count, world.chunk_count());
  assert!(count > 1);
  assert_eq!(world.layer_quality(layer).unwrap(), low);
  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert_eq!(chunk.samples().side(), low.sample_side());
  assert_eq!(world.history(layer).unwrap().len(), 1);

  assert!(world.flush(FLUSH));
  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  assert!(chunk.resources().front.as_ref().unwrap().triangle_count() > 0);
}

#[test]
fn test_remesh_picks_up_material_changes() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert!(world.flush(FLUSH));

  world.layer_config_mut(layer).unwrap().cut_material = Some(1);
  world.remesh_layer(layer).unwrap();
  assert!(world.flush(FLUSH));

  let resources = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap().resources();
  assert!(resources.cut.as_ref().unwrap().triangle_count() > 0);
  assert!(resources.back.as_ref().unwrap().triangle_count() > 0);
}

#[test]
fn test_stale_result_is_discarded() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 50.0)).unwrap();
  assert_eq!(world.tick().scheduled, 1);

  world.clear_layer(layer).unwrap();
  let result = world.queue.recv_timeout(FLUSH).unwrap();
  let mut stats = TickStats::default();
  world.apply_result(result, &mut stats);
  assert_eq!(stats.discarded, 1);
  assert_eq!(stats.applied, 0);
  assert!(world.is_idle());
}

#[test]
fn test_superseded_rebuild_is_redone() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::new(-40.0, 0.0), 30.0)).unwrap();
  assert_eq!(world.tick().scheduled, 1);

  // Changes while the first job is in flight.
  world.add(layer, circle(Vec2::new(60.0, 0.0), 30.0)).unwrap();
  assert!(world.flush(FLUSH));

  let chunk = world.chunk(layer, ChunkCoord::new(0, 0)).unwrap();
  let front = chunk.resources().front.as_ref().unwrap();
  assert!(front.bounds.min[0] < -60.0);
  assert!(front.bounds.max[0] > 80.0);
}

#[test]
fn test_clear_layer() {
  let (mut world, layer) = world_with_layer(LayerConfig::default());
  world.add(layer, circle(Vec2::ZERO, 300.0)).unwrap();
  assert!(world.chunk_count() > 1);
  world.clear_layer(layer).unwrap();
  assert_eq!(world.chunk_count(), 0);
  assert!(world.history(layer).unwrap().is_empty());
}
