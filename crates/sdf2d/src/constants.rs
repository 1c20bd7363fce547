//! Sample grid constants for 2D distance chunks.
//!
//! # Sample Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CHUNK SAMPLE LAYOUT (one axis)                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sample index:   0      1      2    ...   res    res+1   res+2          │
//! │                  │      │                  │       │       │            │
//! │                  │      └──── res cells ───┘       │       │            │
//! │                  │      -size/2        +size/2     │       │            │
//! │                  │                                 │       │            │
//! │                  └─ negative apron                 └───────┴─ positive  │
//! │                                                               apron     │
//! │                                                                         │
//! │  Virtual ring: lookups at index -1 and side return FAR_OUTSIDE, so the  │
//! │  tracer can walk one cell past the stored grid and every loop closes.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neighbouring chunks store `2 * APRON + 1` identical sample columns along
//! their shared edge. Both chunks therefore see the same crossings there and
//! trace matching contour vertices on the seam.
//!
//! # Memory Layout
//!
//! ```text
//! index = y * side + x      (row-major, X fastest)
//! ```

/// Surface threshold in quantized sample space.
///
/// Samples below are inside (solid), above are outside (empty). Byte samples
/// can never equal this value.
pub const SURFACE: f32 = 127.5;

/// Sample value of a fully empty cell and of out-of-range lookups.
pub const FAR_OUTSIDE: u8 = 255;

/// Sample value of a fully solid cell.
pub const FAR_INSIDE: u8 = 0;

/// Extra samples stored beyond each chunk edge.
pub const APRON: usize = 1;

/// Dot product above which two consecutive contour edges count as collinear.
pub const COLLINEAR_DOT: f32 = 1.0 - 1e-5;

/// Distance from the chunk edge within which contour vertices are pinned.
pub const BOUNDARY_EPSILON: f32 = 1e-4;

/// Loops with an absolute signed area below this are discarded.
pub const MIN_LOOP_AREA: f32 = 1e-6;

/// Samples per axis for a chunk with `resolution` cells across it.
#[inline(always)]
pub const fn sample_side(resolution: usize) -> usize {
  resolution + 1 + 2 * APRON
}

/// Row-major linear index of sample `(x, y)`.
#[inline(always)]
pub const fn sample_index(x: usize, y: usize, side: usize) -> usize {
  y * side + x
}

/// Inverse of [`sample_index`].
#[inline(always)]
pub const fn index_to_sample(idx: usize, side: usize) -> (usize, usize) {
  (idx % side, idx / side)
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
