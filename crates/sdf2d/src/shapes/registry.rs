//! Binary shape persistence.
//!
//! ```text
//!   shape   := tag:u16 payload
//!   payload := type-specific fields, little-endian
//!   string  := len:u32 utf8-bytes
//! ```
//!
//! Tags are assigned in registration order. The built-in order is fixed so
//! saved histories stay readable: rect 0, circle 1, line 2, texture 3,
//! translate 4, transform 5, expand 6.

use glam::Vec2;

use super::{
  CircleSdf, Expand, LineSdf, RectSdf, Shape, ShapeRef, ShapeType, TextureSdf, Transform,
  Translate,
};
use crate::error::ShapeError;

/// Append-only little-endian byte sink.
#[derive(Clone, Debug, Default)]
pub struct ShapeWriter {
  bytes: Vec<u8>,
}

impl ShapeWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn write_u8(&mut self, value: u8) {
    self.bytes.push(value);
  }

  pub fn write_u16(&mut self, value: u16) {
    self.bytes.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_u32(&mut self, value: u32) {
    self.bytes.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_f32(&mut self, value: f32) {
    self.bytes.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_vec2(&mut self, value: Vec2) {
    self.write_f32(value.x);
    self.write_f32(value.y);
  }

  pub fn write_str(&mut self, value: &str) {
    self.write_u32(value.len() as u32);
    self.bytes.extend_from_slice(value.as_bytes());
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }
}

/// Cursor over bytes produced by [`ShapeWriter`].
#[derive(Clone, Debug)]
pub struct ShapeReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> ShapeReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  pub fn remaining(&self) -> usize {
    self.bytes.len() - self.pos
  }

  pub fn is_at_end(&self) -> bool {
    self.remaining() == 0
  }

  fn take(&mut self, needed: usize) -> Result<&'a [u8], ShapeError> {
    let remaining = self.remaining();
    if needed > remaining {
      return Err(ShapeError::UnexpectedEof { needed, remaining });
    }
    let slice = &self.bytes[self.pos..self.pos + needed];
    self.pos += needed;
    Ok(slice)
  }

  fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ShapeError> {
    let mut out = [0u8; N];
    out.copy_from_slice(self.take(N)?);
    Ok(out)
  }

  pub fn read_u8(&mut self) -> Result<u8, ShapeError> {
    Ok(self.take_array::<1>()?[0])
  }

  pub fn read_u16(&mut self) -> Result<u16, ShapeError> {
    Ok(u16::from_le_bytes(self.take_array()?))
  }

  pub fn read_u32(&mut self) -> Result<u32, ShapeError> {
    Ok(u32::from_le_bytes(self.take_array()?))
  }

  pub fn read_f32(&mut self) -> Result<f32, ShapeError> {
    Ok(f32::from_le_bytes(self.take_array()?))
  }

  pub fn read_vec2(&mut self) -> Result<Vec2, ShapeError> {
    let x = self.read_f32()?;
    let y = self.read_f32()?;
    Ok(Vec2::new(x, y))
  }

  pub fn read_string(&mut self) -> Result<String, ShapeError> {
    let len = self.read_u32()? as usize;
    let bytes = self.take(len)?;
    Ok(String::from_utf8(bytes.to_vec())?)
  }
}

type ReadFn = fn(&mut ShapeReader<'_>, &ShapeRegistry) -> Result<ShapeRef, ShapeError>;

fn read_erased<T: ShapeType>(
  reader: &mut ShapeReader<'_>,
  registry: &ShapeRegistry,
) -> Result<ShapeRef, ShapeError> {
  Ok(std::sync::Arc::new(T::read_payload(reader, registry)?))
}

/// Maps shape type names to stable `u16` tags and back to readers.
#[derive(Clone)]
pub struct ShapeRegistry {
  entries: Vec<(&'static str, ReadFn)>,
}

impl std::fmt::Debug for ShapeRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list()
      .entries(self.entries.iter().map(|(name, _)| name))
      .finish()
  }
}

impl Default for ShapeRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl ShapeRegistry {
  /// Registry holding the built-in shapes.
  pub fn new() -> Self {
    let mut registry = Self::empty();
    registry.entries = vec![
      (RectSdf::TYPE_NAME, read_erased::<RectSdf> as ReadFn),
      (CircleSdf::TYPE_NAME, read_erased::<CircleSdf>),
      (LineSdf::TYPE_NAME, read_erased::<LineSdf>),
      (TextureSdf::TYPE_NAME, read_erased::<TextureSdf>),
      (Translate::TYPE_NAME, read_erased::<Translate>),
      (Transform::TYPE_NAME, read_erased::<Transform>),
      (Expand::TYPE_NAME, read_erased::<Expand>),
    ];
    registry
  }

  /// Registry with no shape types.
  pub fn empty() -> Self {
    Self {
      entries: Vec::new(),
    }
  }

  /// Register a shape type; returns its tag.
  pub fn register<T: ShapeType>(&mut self) -> Result<u16, ShapeError> {
    if self.tag_of(T::TYPE_NAME).is_some() {
      return Err(ShapeError::DuplicateType(T::TYPE_NAME.to_string()));
    }
    let tag = u16::try_from(self.entries.len())
      .map_err(|_| ShapeError::InvalidData("shape registry is full".to_string()))?;
    self.entries.push((T::TYPE_NAME, read_erased::<T>));
    Ok(tag)
  }

  pub fn tag_of(&self, type_name: &str) -> Option<u16> {
    self
      .entries
      .iter()
      .position(|(name, _)| *name == type_name)
      .map(|index| index as u16)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Write tag and payload.
  pub fn write_shape(&self, shape: &dyn Shape, writer: &mut ShapeWriter) -> Result<(), ShapeError> {
    let tag = self
      .tag_of(shape.type_name())
      .ok_or_else(|| ShapeError::UnregisteredType(shape.type_name().to_string()))?;
    writer.write_u16(tag);
    shape.write_payload(writer, self)
  }

  /// Read one shape (tag and payload).
  pub fn read_shape(&self, reader: &mut ShapeReader<'_>) -> Result<ShapeRef, ShapeError> {
    let tag = reader.read_u16()?;
    let (_, read) = self
      .entries
      .get(tag as usize)
      .ok_or(ShapeError::UnknownTag(tag))?;
    read(reader, self)
  }

  pub fn to_bytes(&self, shape: &dyn Shape) -> Result<Vec<u8>, ShapeError> {
    let mut writer = ShapeWriter::new();
    self.write_shape(shape, &mut writer)?;
    Ok(writer.into_bytes())
  }

  /// Read a single shape that spans all of `bytes`.
  pub fn from_bytes(&self, bytes: &[u8]) -> Result<ShapeRef, ShapeError> {
    let mut reader = ShapeReader::new(bytes);
    let shape = self.read_shape(&mut reader)?;
    if !reader.is_at_end() {
      return Err(ShapeError::InvalidData(format!(
        "{} trailing bytes after shape",
        reader.remaining()
      )));
    }
    Ok(shape)
  }
}
