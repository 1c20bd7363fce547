//! Primitive shapes.

use glam::Vec2;

use super::{DistanceField, Shape, ShapeReader, ShapeRegistry, ShapeType, ShapeWriter};
use crate::error::ShapeError;
use crate::types::Aabb2;

/// Axis-aligned rectangle with optionally rounded corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectSdf {
  pub min: Vec2,
  pub max: Vec2,
  pub corner_radius: f32,
}

impl RectSdf {
  pub fn new(min: Vec2, max: Vec2) -> Self {
    Self {
      min: min.min(max),
      max: min.max(max),
      corner_radius: 0.0,
    }
  }

  pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
    Self::new(center - size * 0.5, center + size * 0.5)
  }

  pub fn with_corner_radius(mut self, radius: f32) -> Self {
    self.corner_radius = radius;
    self
  }
}

impl DistanceField for RectSdf {
  fn bounds(&self) -> Aabb2 {
    Aabb2::new(self.min, self.max)
  }

  fn distance(&self, point: Vec2) -> f32 {
    let center = (self.min + self.max) * 0.5;
    let half = (self.max - self.min) * 0.5;
    let radius = self.corner_radius.clamp(0.0, half.min_element());
    let q = (point - center).abs() - half + Vec2::splat(radius);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - radius
  }
}

impl Shape for RectSdf {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(&self, writer: &mut ShapeWriter, _: &ShapeRegistry) -> Result<(), ShapeError> {
    writer.write_vec2(self.min);
    writer.write_vec2(self.max);
    writer.write_f32(self.corner_radius);
    Ok(())
  }
}

impl ShapeType for RectSdf {
  const TYPE_NAME: &'static str = "rect";

  fn read_payload(reader: &mut ShapeReader<'_>, _: &ShapeRegistry) -> Result<Self, ShapeError> {
    let min = reader.read_vec2()?;
    let max = reader.read_vec2()?;
    let corner_radius = reader.read_f32()?;
    Ok(Self {
      min,
      max,
      corner_radius,
    })
  }
}

/// Disc.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleSdf {
  pub center: Vec2,
  pub radius: f32,
}

impl CircleSdf {
  pub fn new(center: Vec2, radius: f32) -> Self {
    Self { center, radius }
  }
}

impl DistanceField for CircleSdf {
  fn bounds(&self) -> Aabb2 {
    Aabb2::from_center_half_extents(self.center, Vec2::splat(self.radius.max(0.0)))
  }

  fn distance(&self, point: Vec2) -> f32 {
    point.distance(self.center) - self.radius
  }
}

impl Shape for CircleSdf {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(&self, writer: &mut ShapeWriter, _: &ShapeRegistry) -> Result<(), ShapeError> {
    writer.write_vec2(self.center);
    writer.write_f32(self.radius);
    Ok(())
  }
}

impl ShapeType for CircleSdf {
  const TYPE_NAME: &'static str = "circle";

  fn read_payload(reader: &mut ShapeReader<'_>, _: &ShapeRegistry) -> Result<Self, ShapeError> {
    let center = reader.read_vec2()?;
    let radius = reader.read_f32()?;
    Ok(Self { center, radius })
  }
}

/// Capsule around the segment `a`-`b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSdf {
  pub a: Vec2,
  pub b: Vec2,
  pub radius: f32,
}

impl LineSdf {
  pub fn new(a: Vec2, b: Vec2, radius: f32) -> Self {
    Self { a, b, radius }
  }
}

impl DistanceField for LineSdf {
  fn bounds(&self) -> Aabb2 {
    Aabb2::from_points([self.a, self.b]).grow(self.radius.max(0.0))
  }

  fn distance(&self, point: Vec2) -> f32 {
    let pa = point - self.a;
    let ba = self.b - self.a;
    let len_sq = ba.length_squared();
    let h = if len_sq > 0.0 {
      (pa.dot(ba) / len_sq).clamp(0.0, 1.0)
    } else {
      0.0
    };
    (pa - ba * h).length() - self.radius
  }
}

impl Shape for LineSdf {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(&self, writer: &mut ShapeWriter, _: &ShapeRegistry) -> Result<(), ShapeError> {
    writer.write_vec2(self.a);
    writer.write_vec2(self.b);
    writer.write_f32(self.radius);
    Ok(())
  }
}

impl ShapeType for LineSdf {
  const TYPE_NAME: &'static str = "line";

  fn read_payload(reader: &mut ShapeReader<'_>, _: &ShapeRegistry) -> Result<Self, ShapeError> {
    let a = reader.read_vec2()?;
    let b = reader.read_vec2()?;
    let radius = reader.read_f32()?;
    Ok(Self { a, b, radius })
  }
}
