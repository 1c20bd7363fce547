//! Asynchronous chunk mesh rebuilds.
//!
//! Jobs run on rayon's pool via `rayon::spawn`; finished meshes come back
//! over a crossbeam channel and are applied by the owner in `World::tick`.
//!
//! ```text
//!   owner thread                 rayon workers
//!   ────────────                 ─────────────
//!   schedule(key, job) ─spawn─►  checkout scratch
//!        │                       mesher.mesh(job)
//!        │                       send RebuildResult ─┐
//!   try_recv / drain ◄───────────────────────────────┘
//!        │
//!        └─► chunk still there and job id current? apply : discard
//! ```
//!
//! Jobs are never interrupted. A result is stale when its chunk was removed
//! or a newer job was scheduled for it, and the owner simply drops it.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{self as channel, Receiver, Sender};
use web_time::Instant;

use crate::chunk::ChunkKey;
use crate::mesher::{ChunkMeshes, ContourMesher, MeshJob, Mesher};
use crate::pool::ScratchPool;

/// Idle scratch objects kept per queue.
const SCRATCH_POOL_CAPACITY: usize = 16;

/// Rebuild ticket, unique per queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
  pub const fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

/// Finished rebuild.
#[derive(Debug)]
pub struct RebuildResult {
  pub key: ChunkKey,
  pub job: JobId,
  pub meshes: ChunkMeshes,
  /// Build time on the worker, microseconds.
  pub mesh_time_us: u64,
}

/// Background mesh rebuild queue.
pub struct RebuildQueue<M: Mesher + 'static = ContourMesher> {
  mesher: Arc<M>,
  pool: ScratchPool<M::Scratch>,
  sender: Sender<RebuildResult>,
  receiver: Receiver<RebuildResult>,
  next_id: u64,
  in_flight: usize,
}

impl Default for RebuildQueue<ContourMesher> {
  fn default() -> Self {
    Self::new(ContourMesher)
  }
}

impl<M: Mesher + 'static> RebuildQueue<M> {
  pub fn new(mesher: M) -> Self {
    let (sender, receiver) = channel::unbounded();
    Self {
      mesher: Arc::new(mesher),
      pool: ScratchPool::new(SCRATCH_POOL_CAPACITY),
      sender,
      receiver,
      next_id: 0,
      in_flight: 0,
    }
  }

  /// Start a rebuild on the worker pool.
  pub fn schedule(&mut self, key: ChunkKey, job: MeshJob) -> JobId {
    let id = JobId(self.next_id);
    self.next_id += 1;
    self.in_flight += 1;

    let mesher = Arc::clone(&self.mesher);
    let pool = self.pool.clone();
    let sender = self.sender.clone();
    rayon::spawn(move || {
      let start = Instant::now();
      let mut scratch = pool.checkout();
      let meshes = mesher.mesh(&job, &mut scratch);
      drop(scratch);
      let mesh_time_us = start.elapsed().as_micros() as u64;
      // The queue may already be gone.
      let _ = sender.send(RebuildResult {
        key,
        job: id,
        meshes,
        mesh_time_us,
      });
    });

    tracing::debug!(?key, job = id.0, "scheduled chunk rebuild");
    id
  }

  /// Next finished rebuild, if any.
  pub fn try_recv(&mut self) -> Option<RebuildResult> {
    let result = self.receiver.try_recv().ok()?;
    self.in_flight -= 1;
    Some(result)
  }

  /// Wait up to `timeout` for the next finished rebuild.
  pub fn recv_timeout(&mut self, timeout: Duration) -> Option<RebuildResult> {
    if self.in_flight == 0 {
      return None;
    }
    let result = self.receiver.recv_timeout(timeout).ok()?;
    self.in_flight -= 1;
    Some(result)
  }

  /// All rebuilds finished so far.
  pub fn drain(&mut self) -> Vec<RebuildResult> {
    std::iter::from_fn(|| self.try_recv()).collect()
  }

  /// Scheduled rebuilds whose results have not been received yet.
  pub fn in_flight(&self) -> usize {
    self.in_flight
  }

  pub fn is_idle(&self) -> bool {
    self.in_flight == 0
  }

  /// Scratch objects currently idle in the pool.
  pub fn idle_scratch(&self) -> usize {
    self.pool.idle()
  }
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod rebuild_test;
