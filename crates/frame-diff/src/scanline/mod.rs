//! Per-scanline diffs
//!
//! Both strategies emit single-row spans, linked in scan order (increasing
//! `y`, then increasing `x`), optionally over one interlaced field only.
//!
//! - [`coarse`]: 4-pixel (64-bit) groups, boundaries refined by bit-scan;
//!   needs `width % 4 == 0` and `stride_bytes % 8 == 0`.
//! - [`exact`]: pixel-exact, bridges gaps up to the merge threshold; works
//!   for any geometry.

pub mod coarse;
pub mod exact;

pub use coarse::diff_scanlines_coarse;
pub use exact::diff_scanlines_exact;

use crate::geometry::FrameGeometry;

/// `true` when the coarse 4-pixel diff can run on this geometry
// Safety: modulo by non-zero constants.
#[allow(clippy::arithmetic_side_effects)]
pub const fn coarse_compatible(geometry: &FrameGeometry) -> bool {
    geometry.width() % 4 == 0 && geometry.stride_bytes() % 8 == 0
}
