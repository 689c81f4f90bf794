//! Pixel-exact scanline diff
//!
//! Rows are probed two pixels at a time (one 32-bit compare). Once a span is
//! open, it keeps growing pixel by pixel while the run of unchanged pixels
//! since its last differing pixel stays within the merge threshold, so small
//! gaps are sent rather than paying for another span. Span edges are always
//! exact: a span never starts or ends on an unchanged pixel.

use crate::geometry::{Frame, Interlace};
use crate::span::{coord, Span, SpanIndex, SpanPool};

/// Pixels `x` and `x + 1` as one word, pixel `x` in the low half
// Safety: callers pass x + 1 < row length.
#[inline(always)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
fn pair(row: &[u16], x: usize) -> u32 {
    u32::from(row[x]) | (u32::from(row[x + 1]) << 16)
}

/// Diff the scanned rows exactly, bridging unchanged gaps of up to `merge_threshold` pixels
///
/// Returns the list head, or `None` when no pixel differs. With a threshold
/// of 0 every maximal run of differing pixels becomes its own span.
// Safety: x only advances while x < width (or x + 1 < width for the probe), so every
// index is inside the row; x <= width <= u16::MAX bounds the arithmetic.
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
pub fn diff_scanlines_exact(
    cur: Frame<'_>,
    prev: Frame<'_>,
    interlace: Interlace,
    merge_threshold: u32,
    pool: &mut SpanPool,
) -> Option<SpanIndex> {
    let geometry = cur.geometry();
    debug_assert_eq!(geometry, prev.geometry());

    let width = geometry.width();
    let mut head = None;

    for y in interlace.rows(geometry.height()) {
        let (row, prev_row) = (cur.row(y), prev.row(y));
        let mut x = 0;
        while x < width {
            let (start, end) = if x + 1 < width {
                let diff = pair(row, x) ^ pair(prev_row, x);
                x += 2;
                let (start, mut end, mut unchanged_run) = match (diff & 0xFFFF != 0, diff >> 16 != 0) {
                    (false, false) => continue,
                    (false, true) => (x - 1, x, 0u32),
                    (true, true) => (x - 2, x, 0),
                    (true, false) => (x - 2, x - 1, 1),
                };
                while x < width && unchanged_run <= merge_threshold {
                    let differs = row[x] != prev_row[x];
                    x += 1;
                    if differs {
                        end = x;
                        unchanged_run = 0;
                    } else {
                        unchanged_run = unchanged_run.saturating_add(1);
                    }
                }
                (start, end)
            } else {
                // Odd trailing pixel (or a 1-pixel-wide frame)
                let differs = row[x] != prev_row[x];
                x += 1;
                if !differs {
                    break;
                }
                (x - 1, x)
            };

            let index = pool.push(Span::row(coord(start), coord(end), coord(y)));
            head.get_or_insert(index);
        }
    }
    head
}
