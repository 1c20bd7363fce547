use std::time::Duration;

use glam::Vec2;

use super::*;
use crate::chunk::{ChunkCoord, ChunkKey};
use crate::layer::{LayerConfig, LayerId};
use crate::mesher::MeshSettings;
use crate::quality::QualityPreset;
use crate::sample_array::SampleArray;
use crate::shapes::CircleSdf;

fn key(x: i32) -> ChunkKey {
  ChunkKey {
    layer: LayerId(0),
    coord: ChunkCoord::new(x, 0),
  }
}

fn circle_job() -> MeshJob {
  let quality = QualityPreset::Low.quality();
  let mut array = SampleArray::new(quality);
  array.add(&CircleSdf::new(Vec2::ZERO, 60.0));
  MeshJob {
    samples: array.snapshot(),
    settings: MeshSettings::new(&LayerConfig::default(), quality, Vec2::ZERO, false),
  }
}

fn wait_all(queue: &mut RebuildQueue) -> Vec<RebuildResult> {
  let mut results = Vec::new();
  while !queue.is_idle() {
    match queue.recv_timeout(Duration::from_secs(10)) {
      Some(result) => results.push(result),
      None => break,
    }
  }
  results
}

#[test]
fn test_results_come_back_with_their_ids() {
  let mut queue = RebuildQueue::default();
  let a = queue.schedule(key(0), circle_job());
  let b = queue.schedule(key(1), circle_job());
  assert_ne!(a, b);
  assert_eq!(queue.in_flight(), 2);

  let mut results = wait_all(&mut queue);
  assert_eq!(results.len(), 2);
  assert!(queue.is_idle());

  results.sort_by_key(|r| r.job);
  assert_eq!(results[0].job, a);
  assert_eq!(results[0].key, key(0));
  assert_eq!(results[1].key, key(1));
  assert!(results.iter().all(|r| !r.meshes.front.is_empty()));
}

#[test]
fn test_scratch_returns_to_pool() {
  let mut queue = RebuildQueue::default();
  queue.schedule(key(0), circle_job());
  wait_all(&mut queue);
  assert!(queue.idle_scratch() >= 1);
}

#[test]
fn test_idle_queue_does_not_block() {
  let mut queue = RebuildQueue::default();
  assert!(queue.try_recv().is_none());
  assert!(queue.recv_timeout(Duration::from_secs(60)).is_none());
  assert!(queue.drain().is_empty());
}

#[test]
fn test_job_ids_increase() {
  let mut queue = RebuildQueue::default();
  let ids: Vec<JobId> = (0..4).map(|x| queue.schedule(key(x), circle_job())).collect();
  assert!(ids.windows(2).all(|w| w[0] < w[1]));
  assert_eq!(wait_all(&mut queue).len(), 4);
}
