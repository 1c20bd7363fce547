//! Per-layer configuration.

use crate::quality::{Quality, QualityPreset};
use crate::types::MaterialId;

/// Index of a layer inside its world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// Profile used where the flat caps meet the side wall.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum EdgeStyle {
  /// Caps meet the wall at a right angle.
  #[default]
  Sharp,

  /// 45° chamfer.
  Bevel { radius: f32 },

  /// Quarter-circle arc split into `faces` segments.
  Round { radius: f32, faces: u32 },
}

impl EdgeStyle {
  /// Edge radius clamped to the half-depth; zero for sharp edges.
  pub fn effective_radius(&self, half_depth: f32) -> f32 {
    match *self {
      EdgeStyle::Sharp => 0.0,
      EdgeStyle::Bevel { radius } | EdgeStyle::Round { radius, .. } => {
        radius.max(0.0).min(half_depth)
      }
    }
  }
}

/// Static configuration of one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerConfig {
  /// Extrusion depth along Z.
  pub depth: f32,

  /// Z coordinate of the extrusion's mid-plane.
  pub z_offset: f32,

  /// Quality used for chunks created from now on.
  pub quality: Quality,

  pub front_material: Option<MaterialId>,
  pub back_material: Option<MaterialId>,
  pub cut_material: Option<MaterialId>,

  pub edge_style: EdgeStyle,

  /// Largest angle in degrees between neighbouring wall facets that is still
  /// shaded smooth.
  pub max_smoothing_angle: f32,

  /// Build a collision mesh (also requires physics on the world).
  pub collision: bool,

  /// World units to texture units for cap UVs and wall U.
  pub uv_scale: f32,
}

impl Default for LayerConfig {
  fn default() -> Self {
    Self {
      depth: 64.0,
      z_offset: 0.0,
      quality: Quality::default(),
      front_material: Some(0),
      back_material: Some(0),
      cut_material: Some(0),
      edge_style: EdgeStyle::Sharp,
      max_smoothing_angle: 40.0,
      collision: false,
      uv_scale: 1.0,
    }
  }
}

impl LayerConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_depth(mut self, depth: f32) -> Self {
    self.depth = depth;
    self
  }

  pub fn with_z_offset(mut self, z_offset: f32) -> Self {
    self.z_offset = z_offset;
    self
  }

  pub fn with_preset(mut self, preset: QualityPreset) -> Self {
    self.quality = preset.quality();
    self
  }

  pub fn with_quality(mut self, quality: Quality) -> Self {
    self.quality = quality;
    self
  }

  /// Same material on front, back and cut faces.
  pub fn with_material(mut self, material: Option<MaterialId>) -> Self {
    self.front_material = material;
    self.back_material = material;
    self.cut_material = material;
    self
  }

  pub fn with_materials(
    mut self,
    front: Option<MaterialId>,
    back: Option<MaterialId>,
    cut: Option<MaterialId>,
  ) -> Self {
    self.front_material = front;
    self.back_material = back;
    self.cut_material = cut;
    self
  }

  pub fn with_edge_style(mut self, style: EdgeStyle) -> Self {
    self.edge_style = style;
    self
  }

  pub fn with_max_smoothing_angle(mut self, degrees: f32) -> Self {
    self.max_smoothing_angle = degrees;
    self
  }

  pub fn with_collision(mut self, collision: bool) -> Self {
    self.collision = collision;
    self
  }

  pub fn with_uv_scale(mut self, uv_scale: f32) -> Self {
    self.uv_scale = uv_scale;
    self
  }

  /// True if any face stream has a material to render with.
  pub fn has_render_materials(&self) -> bool {
    self.front_material.is_some() || self.back_material.is_some() || self.cut_material.is_some()
  }

  /// True if all three streams use one material and can share one mesh.
  pub fn single_material(&self) -> bool {
    self.front_material.is_some()
      && self.front_material == self.back_material
      && self.front_material == self.cut_material
  }
}

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;
