//! Coarse scanline diff at 4-pixel granularity
//!
//! Each row is compared one 64-bit lane (4 pixels) at a time. A differing
//! lane opens a span at its first differing pixel (trailing-zero count); the
//! span grows over following differing lanes and closes at the first equal
//! lane, cut after the last differing pixel of the previous lane
//! (leading-zero count). A span still open at the end of the row closes at
//! the row boundary, so edges are exact at the start and within 3 pixels at
//! the row end.

use crate::compare::pack4;
use crate::geometry::{Frame, Interlace};
use crate::span::{coord, Span, SpanIndex, SpanPool};

/// XOR of lane `group` of both rows
// Safety: group < width / 4, so group * 4 + 4 <= row length.
#[inline(always)]
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
fn lane_diff(cur: &[u16], prev: &[u16], group: usize) -> u64 {
    let x = group * 4;
    pack4(&cur[x..]) ^ pack4(&prev[x..])
}

/// Diff the scanned rows in 4-pixel lanes, one span per run of differing lanes
///
/// Returns the list head, or `None` when no lane differs. The geometry must
/// satisfy [`super::coarse_compatible`].
// Safety: group indices stay below width / 4; the lane arithmetic is bounded by width <= u16::MAX,
// and leading_zeros >> 4 <= 3 < group * 4 for a closing group >= 1.
#[allow(clippy::arithmetic_side_effects)]
pub fn diff_scanlines_coarse(
    cur: Frame<'_>,
    prev: Frame<'_>,
    interlace: Interlace,
    pool: &mut SpanPool,
) -> Option<SpanIndex> {
    let geometry = cur.geometry();
    debug_assert!(super::coarse_compatible(&geometry));
    debug_assert_eq!(geometry, prev.geometry());

    let width = geometry.width();
    let groups = width / 4;
    let mut head = None;

    for y in interlace.rows(geometry.height()) {
        let (row, prev_row) = (cur.row(y), prev.row(y));
        let mut group = 0;
        while group < groups {
            let diff = lane_diff(row, prev_row, group);
            if diff == 0 {
                group += 1;
                continue;
            }

            let start = group * 4 + (diff.trailing_zeros() >> 4) as usize;
            let mut last_diff = diff;
            group += 1;
            let end = loop {
                if group >= groups {
                    break width;
                }
                let diff = lane_diff(row, prev_row, group);
                if diff == 0 {
                    let end = group * 4 - (last_diff.leading_zeros() >> 4) as usize;
                    group += 1;
                    break end;
                }
                last_diff = diff;
                group += 1;
            };

            let index = pool.push(Span::row(coord(start), coord(end), coord(y)));
            head.get_or_insert(index);
        }
    }
    head
}
