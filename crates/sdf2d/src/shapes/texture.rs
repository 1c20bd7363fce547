//! Distance field baked into an image channel.
//!
//! The channel stores a signed distance gradient: 0.5 on the surface, lower
//! values outside, higher values inside, spanning `gradient_px` pixels from
//! 0 to 1. Pixel row 0 is the top of the image and maps to the largest Y.

use glam::Vec2;

use super::{DistanceField, Shape, ShapeReader, ShapeRegistry, ShapeType, ShapeWriter};
use crate::error::ShapeError;
use crate::types::Aabb2;

/// Image-backed shape covering the rectangle
/// `[world_offset, world_offset + world_size]`.
#[derive(Clone)]
pub struct TextureSdf {
  path: String,
  gradient_px: f32,
  channel: u8,
  world_size: Vec2,
  world_offset: Vec2,
  width: usize,
  height: usize,
  /// World-space distances, row-major from the top row.
  distances: Vec<f32>,
}

impl std::fmt::Debug for TextureSdf {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TextureSdf")
      .field("path", &self.path)
      .field("gradient_px", &self.gradient_px)
      .field("channel", &self.channel)
      .field("world_size", &self.world_size)
      .field("world_offset", &self.world_offset)
      .field("width", &self.width)
      .field("height", &self.height)
      .finish()
  }
}

impl TextureSdf {
  /// Load `path` and read distances from `channel` (0 = R .. 3 = A).
  pub fn load(
    path: impl Into<String>,
    gradient_px: f32,
    channel: u8,
    world_size: Vec2,
    world_offset: Vec2,
  ) -> Result<Self, ShapeError> {
    let path = path.into();
    let image = image::open(&path)
      .map_err(|source| ShapeError::Texture {
        path: path.clone(),
        source,
      })?
      .to_rgba8();
    let (width, height) = image.dimensions();
    Self::from_rgba8(
      path,
      width as usize,
      height as usize,
      image.as_raw(),
      gradient_px,
      channel,
      world_size,
      world_offset,
    )
  }

  /// Build from raw RGBA8 pixels. `path` is kept for persistence only.
  #[allow(clippy::too_many_arguments)]
  pub fn from_rgba8(
    path: impl Into<String>,
    width: usize,
    height: usize,
    rgba: &[u8],
    gradient_px: f32,
    channel: u8,
    world_size: Vec2,
    world_offset: Vec2,
  ) -> Result<Self, ShapeError> {
    if channel > 3 {
      return Err(ShapeError::InvalidData(format!(
        "texture channel must be 0..=3, got {channel}"
      )));
    }
    if width == 0 || height == 0 || rgba.len() < width * height * 4 {
      return Err(ShapeError::InvalidData(format!(
        "texture {width}x{height} needs {} bytes, got {}",
        width * height * 4,
        rgba.len()
      )));
    }
    if !(world_size.x > 0.0 && world_size.y > 0.0) {
      return Err(ShapeError::InvalidData(format!(
        "texture world size must be positive, got {world_size}"
      )));
    }

    // Pixel gradients are isotropic; with non-square texels the shorter side
    // keeps distances from overshooting.
    let world_per_px = (world_size / Vec2::new(width as f32, height as f32)).min_element();
    let distances = rgba
      .chunks_exact(4)
      .take(width * height)
      .map(|pixel| {
        let value = pixel[channel as usize] as f32 / 255.0;
        (0.5 - value) * gradient_px * world_per_px
      })
      .collect();

    Ok(Self {
      path: path.into(),
      gradient_px,
      channel,
      world_size,
      world_offset,
      width,
      height,
      distances,
    })
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn dimensions(&self) -> (usize, usize) {
    (self.width, self.height)
  }

  #[inline]
  fn texel(&self, x: usize, y: usize) -> f32 {
    self.distances[y * self.width + x]
  }
}

impl DistanceField for TextureSdf {
  fn bounds(&self) -> Aabb2 {
    Aabb2::new(self.world_offset, self.world_offset + self.world_size)
  }

  /// Bilinear lookup; `+inf` outside the image rectangle.
  fn distance(&self, point: Vec2) -> f32 {
    let rel = point - self.world_offset;
    if rel.x < 0.0 || rel.y < 0.0 || rel.x > self.world_size.x || rel.y > self.world_size.y {
      return f32::INFINITY;
    }

    let px = rel.x / self.world_size.x * self.width as f32 - 0.5;
    let py = (self.world_size.y - rel.y) / self.world_size.y * self.height as f32 - 0.5;

    let max_x = (self.width - 1) as f32;
    let max_y = (self.height - 1) as f32;
    let px = px.clamp(0.0, max_x);
    let py = py.clamp(0.0, max_y);

    let x0 = px.floor() as usize;
    let y0 = py.floor() as usize;
    let x1 = (x0 + 1).min(self.width - 1);
    let y1 = (y0 + 1).min(self.height - 1);
    let tx = px - x0 as f32;
    let ty = py - y0 as f32;

    let top = self.texel(x0, y0) + (self.texel(x1, y0) - self.texel(x0, y0)) * tx;
    let bottom = self.texel(x0, y1) + (self.texel(x1, y1) - self.texel(x0, y1)) * tx;
    top + (bottom - top) * ty
  }
}

impl Shape for TextureSdf {
  fn type_name(&self) -> &'static str {
    Self::TYPE_NAME
  }

  fn write_payload(&self, writer: &mut ShapeWriter, _: &ShapeRegistry) -> Result<(), ShapeError> {
    writer.write_str(&self.path);
    writer.write_f32(self.gradient_px);
    writer.write_u8(self.channel);
    writer.write_vec2(self.world_size);
    writer.write_vec2(self.world_offset);
    Ok(())
  }
}

impl ShapeType for TextureSdf {
  const TYPE_NAME: &'static str = "texture";

  /// Re-opens the image from the stored path.
  fn read_payload(reader: &mut ShapeReader<'_>, _: &ShapeRegistry) -> Result<Self, ShapeError> {
    let path = reader.read_string()?;
    let gradient_px = reader.read_f32()?;
    let channel = reader.read_u8()?;
    let world_size = reader.read_vec2()?;
    let world_offset = reader.read_vec2()?;
    Self::load(path, gradient_px, channel, world_size, world_offset)
  }
}
