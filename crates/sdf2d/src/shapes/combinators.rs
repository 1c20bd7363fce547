//! Wrapper shapes that reposition or dilate another shape.

use glam::Vec2;

use super::{DistanceField, Shape, ShapeReader, ShapeRef, ShapeRegistry, ShapeType, ShapeWriter};
use crate::error::ShapeError;
use crate::types::Aabb2;

/// Shape moved by `offset`.
#[derive(Clone, Debug)]
pub struct Translate {
  pub inner: ShapeRef,
  pub offset: Vec2,
}

impl Translate {
  pub fn new(inner: ShapeRef, offset: Vec2) -> Self {
    Self { inner, offset }
  }
}

impl DistanceField for Translate {
  fn bounds(&self) -> Aabb2 {
    self.inner.bounds().translate(self.offset)
  }

  #[inline]
  fn distance(&self, point: Vec2) -> f32 {
    self.inner.distance(point - self.offset)
  }
}

impl Shape for Translate {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(
    &self,
    writer: &mut ShapeWriter,
    registry: &ShapeRegistry,
  ) -> Result<(), ShapeError> {
    registry.write_shape(self.inner.as_ref(), writer)?;
    writer.write_vec2(self.offset);
    Ok(())
  }
}

impl ShapeType for Translate {
  const TYPE_NAME: &'static str = "translate";

  fn read_payload(
    reader: &mut ShapeReader<'_>,
    registry: &ShapeRegistry,
  ) -> Result<Self, ShapeError> {
    let inner = registry.read_shape(reader)?;
    let offset = reader.read_vec2()?;
    Ok(Self { inner, offset })
  }
}

/// Shape under a similarity transform: uniform scale, then rotation, then
/// translation.
///
/// Distances are scaled with the shape so union thresholds stay in world
/// units whatever the scale.
#[derive(Clone, Debug)]
pub struct Transform {
  pub inner: ShapeRef,
  pub translation: Vec2,
  /// Counter-clockwise rotation in radians.
  pub rotation: f32,
  pub scale: f32,
}

impl Transform {
  /// `scale` must be finite and positive; see [`Transform::try_new`] for
  /// untrusted input.
  pub fn new(inner: ShapeRef, translation: Vec2, rotation: f32, scale: f32) -> Self {
    debug_assert!(
      valid_scale(scale),
      "transform scale must be positive, got {scale}"
    );
    Self {
      inner,
      translation,
      rotation,
      scale,
    }
  }

  pub fn try_new(
    inner: ShapeRef,
    translation: Vec2,
    rotation: f32,
    scale: f32,
  ) -> Result<Self, ShapeError> {
    if !valid_scale(scale) {
      return Err(ShapeError::InvalidData(format!(
        "transform scale must be positive, got {scale}"
      )));
    }
    Ok(Self::new(inner, translation, rotation, scale))
  }

  /// Map a point from the inner shape's space to world space.
  #[inline]
  pub fn to_world(&self, local: Vec2) -> Vec2 {
    Vec2::from_angle(self.rotation).rotate(local * self.scale) + self.translation
  }

  /// Map a world point into the inner shape's space.
  #[inline]
  pub fn to_local(&self, world: Vec2) -> Vec2 {
    Vec2::from_angle(-self.rotation).rotate(world - self.translation) / self.scale
  }
}

impl DistanceField for Transform {
  fn bounds(&self) -> Aabb2 {
    let inner = self.inner.bounds();
    if !inner.is_valid() {
      return inner;
    }
    Aabb2::from_points(inner.corners().map(|corner| self.to_world(corner)))
  }

  #[inline]
  fn distance(&self, point: Vec2) -> f32 {
    self.inner.distance(self.to_local(point)) * self.scale
  }
}

impl Shape for Transform {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(
    &self,
    writer: &mut ShapeWriter,
    registry: &ShapeRegistry,
  ) -> Result<(), ShapeError> {
    registry.write_shape(self.inner.as_ref(), writer)?;
    writer.write_vec2(self.translation);
    writer.write_f32(self.rotation);
    writer.write_f32(self.scale);
    Ok(())
  }
}

impl ShapeType for Transform {
  const TYPE_NAME: &'static str = "transform";

  fn read_payload(
    reader: &mut ShapeReader<'_>,
    registry: &ShapeRegistry,
  ) -> Result<Self, ShapeError> {
    let inner = registry.read_shape(reader)?;
    let translation = reader.read_vec2()?;
    let rotation = reader.read_f32()?;
    let scale = reader.read_f32()?;
    Self::try_new(inner, translation, rotation, scale)
  }
}

#[inline]
fn valid_scale(scale: f32) -> bool {
  scale.is_finite() && scale > 0.0
}

/// Shape grown by `margin` on every side (Minkowski dilation by a disc).
#[derive(Clone, Debug)]
pub struct Expand {
  pub inner: ShapeRef,
  pub margin: f32,
}

impl Expand {
  pub fn new(inner: ShapeRef, margin: f32) -> Self {
    Self { inner, margin }
  }
}

impl DistanceField for Expand {
  fn bounds(&self) -> Aabb2 {
    self.inner.bounds().grow(self.margin)
  }

  #[inline]
  fn distance(&self, point: Vec2) -> f32 {
    self.inner.distance(point) - self.margin
  }
}

impl Shape for Expand {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(
    &self,
    writer: &mut ShapeWriter,
    registry: &ShapeRegistry,
  ) -> Result<(), ShapeError> {
    registry.write_shape(self.inner.as_ref(), writer)?;
    writer.write_f32(self.margin);
    Ok(())
  }
}

impl ShapeType for Expand {
  const TYPE_NAME: &'static str = "expand";

  fn read_payload(
    reader: &mut ShapeReader<'_>,
    registry: &ShapeRegistry,
  ) -> Result<Self, ShapeError> {
    let inner = registry.read_shape(reader)?;
    let margin = reader.read_f32()?;
    Ok(Self { inner, margin })
  }
}
