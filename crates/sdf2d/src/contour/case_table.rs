//! Marching squares case table.
//!
//! ```text
//!   C ─── Top ─── D        bit A = 1   bit B = 2
//!   │             │        bit C = 4   bit D = 8
//!  Left         Right      (set when the corner is inside)
//!   │             │
//!   A ── Bottom ─ B
//! ```
//!
//! Segments run from the first edge's crossing to the second's, with solid
//! material on their left. Outer boundaries therefore wind counter-clockwise
//! and holes clockwise.

use crate::constants::SURFACE;

/// Side of a cell crossed by the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellEdge {
  Bottom,
  Top,
  Left,
  Right,
}

pub const CORNER_A: u8 = 1;
pub const CORNER_B: u8 = 2;
pub const CORNER_C: u8 = 4;
pub const CORNER_D: u8 = 8;

/// Directed segment across one cell.
pub type Segment = (CellEdge, CellEdge);

use CellEdge::{Bottom, Left, Right, Top};

/// Segments per case. The saddles (A+D = 9, B+C = 6) hold their separated
/// form; [`cell_segments`] swaps in the connected form when the decider says
/// so.
const CASE_TABLE: [&[Segment]; 16] = [
  &[],                             // 0: empty
  &[(Bottom, Left)],               // 1: A
  &[(Right, Bottom)],              // 2: B
  &[(Right, Left)],                // 3: A B
  &[(Left, Top)],                  // 4: C
  &[(Bottom, Top)],                // 5: A C
  &[(Right, Bottom), (Left, Top)], // 6: B C (separated)
  &[(Right, Top)],                 // 7: all but D
  &[(Top, Right)],                 // 8: D
  &[(Bottom, Left), (Top, Right)], // 9: A D (separated)
  &[(Top, Bottom)],                // 10: B D
  &[(Top, Left)],                  // 11: all but C
  &[(Left, Right)],                // 12: C D
  &[(Bottom, Right)],              // 13: all but B
  &[(Left, Bottom)],               // 14: all but A
  &[],                             // 15: full
];

/// A and D joined through the cell centre.
const SADDLE_AD_CONNECTED: &[Segment] = &[(Bottom, Right), (Top, Left)];

/// B and C joined through the cell centre.
const SADDLE_BC_CONNECTED: &[Segment] = &[(Left, Bottom), (Right, Top)];

/// Corner bit mask for samples `a` (bottom-left), `b` (bottom-right),
/// `c` (top-left) and `d` (top-right).
#[inline(always)]
pub fn case_index(a: u8, b: u8, c: u8, d: u8) -> u8 {
  let inside = |v: u8| (v as f32) < SURFACE;
  (inside(a) as u8) * CORNER_A
    | (inside(b) as u8) * CORNER_B
    | (inside(c) as u8) * CORNER_C
    | (inside(d) as u8) * CORNER_D
}

/// Saddle decider `(a-s)(d-s) - (b-s)(c-s)` around the surface value `s`.
#[inline(always)]
pub fn saddle_determinant(a: u8, b: u8, c: u8, d: u8) -> f32 {
  let s = |v: u8| v as f32 - SURFACE;
  s(a) * s(d) - s(b) * s(c)
}

/// Directed segments for one cell.
///
/// A zero determinant keeps the diagonal corners separated.
#[inline]
pub fn cell_segments(a: u8, b: u8, c: u8, d: u8) -> &'static [Segment] {
  let case = case_index(a, b, c, d);
  match case {
    9 if saddle_determinant(a, b, c, d) > 0.0 => SADDLE_AD_CONNECTED,
    6 if saddle_determinant(a, b, c, d) < 0.0 => SADDLE_BC_CONNECTED,
    _ => CASE_TABLE[case as usize],
  }
}
