//! Sampling quality: grid resolution, chunk size and distance range.

/// Named quality tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum QualityPreset {
  Low,
  #[default]
  Medium,
  High,
  Extreme,
}

impl QualityPreset {
  pub const ALL: [QualityPreset; 4] = [
    QualityPreset::Low,
    QualityPreset::Medium,
    QualityPreset::High,
    QualityPreset::Extreme,
  ];

  /// `(resolution, chunk size, max distance)` for this tier.
  pub const fn triple(self) -> (usize, f32, f32) {
    match self {
      QualityPreset::Low => (16, 256.0, 64.0),
      QualityPreset::Medium => (32, 256.0, 32.0),
      QualityPreset::High => (64, 256.0, 16.0),
      QualityPreset::Extreme => (128, 256.0, 8.0),
    }
  }

  pub fn quality(self) -> Quality {
    let (resolution, chunk_size, max_distance) = self.triple();
    Quality::new(resolution, chunk_size, max_distance)
  }

  pub fn name(self) -> &'static str {
    match self {
      QualityPreset::Low => "Low",
      QualityPreset::Medium => "Medium",
      QualityPreset::High => "High",
      QualityPreset::Extreme => "Extreme",
    }
  }
}

/// Per-layer sampling constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quality {
  /// Grid cells across one chunk.
  pub resolution: usize,

  /// Chunk edge length in world units.
  pub chunk_size: f32,

  /// World units per cell (`chunk_size / resolution`).
  pub unit_size: f32,

  /// Distance mapped to the end of the quantized range. Samples further
  /// from a shape than this are never touched by it.
  pub max_distance: f32,
}

impl Quality {
  /// # Panics
  /// Debug-asserts a non-zero resolution and positive sizes.
  pub fn new(resolution: usize, chunk_size: f32, max_distance: f32) -> Self {
    debug_assert!(resolution > 0, "quality resolution must be non-zero");
    debug_assert!(chunk_size > 0.0 && max_distance > 0.0);
    Self {
      resolution,
      chunk_size,
      unit_size: chunk_size / resolution as f32,
      max_distance,
    }
  }

  /// Samples stored per axis, aprons included.
  #[inline]
  pub fn sample_side(&self) -> usize {
    crate::constants::sample_side(self.resolution)
  }

  /// Margin around a chunk inside which a shape can still change samples.
  #[inline]
  pub fn influence_margin(&self) -> f32 {
    self.max_distance + self.unit_size
  }
}

impl Default for Quality {
  fn default() -> Self {
    QualityPreset::default().quality()
  }
}

impl From<QualityPreset> for Quality {
  fn from(preset: QualityPreset) -> Self {
    preset.quality()
  }
}

#[cfg(test)]
#[path = "quality_test.rs"]
mod quality_test;
