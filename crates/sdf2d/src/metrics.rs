//! Counters and timing windows for a chunked SDF world.
//!
//! Nothing is recorded unless the crate is built with `--features metrics`
//! and [`COLLECT_METRICS`] is set.
//!
//! ```ignore
//! use sdf2d::metrics::COLLECT_METRICS;
//!
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//! let avg = world.metrics().avg_mesh_timing_us();
//! ```

use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::resources::UploadKind;

/// Switches recording on and off while the `metrics` feature is compiled in.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Last `capacity` durations in microseconds, kept in a ring.
#[derive(Debug, Clone)]
pub struct TimingWindow {
  samples: Vec<u64>,
  capacity: usize,
  /// Slot the next sample overwrites once the ring is full.
  cursor: usize,
}

impl TimingWindow {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      samples: Vec::with_capacity(capacity),
      capacity,
      cursor: 0,
    }
  }

  pub fn record(&mut self, micros: u64) {
    if self.samples.len() < self.capacity {
      self.samples.push(micros);
    } else {
      self.samples[self.cursor] = micros;
    }
    self.cursor = (self.cursor + 1) % self.capacity;
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn clear(&mut self) {
    self.samples.clear();
    self.cursor = 0;
  }

  pub fn latest(&self) -> Option<u64> {
    if self.samples.is_empty() {
      return None;
    }
    let slot = (self.cursor + self.capacity - 1) % self.capacity;
    Some(self.samples[slot])
  }

  pub fn total(&self) -> u64 {
    self.samples.iter().sum()
  }

  /// Mean of the window, 0 when empty.
  pub fn average(&self) -> f64 {
    if self.samples.is_empty() {
      return 0.0;
    }
    self.total() as f64 / self.samples.len() as f64
  }

  /// Fastest and slowest recorded durations.
  pub fn range(&self) -> Option<(u64, u64)> {
    let fastest = self.samples.iter().min()?;
    let slowest = self.samples.iter().max()?;
    Some((*fastest, *slowest))
  }
}

impl Default for TimingWindow {
  fn default() -> Self {
    Self::new(128)
  }
}

/// World statistics, updated by `add`/`subtract` and `tick`.
#[derive(Debug, Clone, Default)]
pub struct WorldMetrics {
  /// Sampling time per `add`/`subtract` call, microseconds.
  pub sample_timings: TimingWindow,
  /// Mesh build time per chunk rebuild, microseconds.
  pub mesh_timings: TimingWindow,
  pub last_mesh_us: u64,

  pub uploads_in_place: u64,
  pub reallocations: u64,

  /// Rebuilds that failed and fell back to empty meshes.
  pub mesh_failures: u64,
  /// Finished rebuilds dropped because their chunk was gone or superseded.
  pub discarded_rebuilds: u64,
  pub total_rebuilds: u64,

  pub live_chunks: usize,
}

impl WorldMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear timings and counters. The live chunk count is kept.
  pub fn reset(&mut self) {
    let live_chunks = self.live_chunks;
    *self = Self::default();
    self.live_chunks = live_chunks;
  }

  pub fn record_sample_timing(&mut self, timing_us: u64) {
    if is_enabled() {
      self.sample_timings.record(timing_us);
    }
  }

  pub fn record_mesh_timing(&mut self, timing_us: u64) {
    if is_enabled() {
      self.mesh_timings.record(timing_us);
      self.last_mesh_us = timing_us;
      self.total_rebuilds += 1;
    }
  }

  pub fn record_upload(&mut self, kind: UploadKind) {
    if !is_enabled() {
      return;
    }
    match kind {
      UploadKind::InPlace => self.uploads_in_place += 1,
      UploadKind::Reallocated => self.reallocations += 1,
    }
  }

  pub fn record_failure(&mut self) {
    if is_enabled() {
      self.mesh_failures += 1;
    }
  }

  pub fn record_discard(&mut self) {
    if is_enabled() {
      self.discarded_rebuilds += 1;
    }
  }

  pub fn set_live_chunks(&mut self, count: usize) {
    if is_enabled() {
      self.live_chunks = count;
    }
  }

  pub fn avg_mesh_timing_us(&self) -> f64 {
    self.mesh_timings.average()
  }

  pub fn avg_sample_timing_us(&self) -> f64 {
    self.sample_timings.average()
  }
}
