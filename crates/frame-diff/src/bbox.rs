//! Bounding-box diff
//!
//! Collapses every change in the frame into one span: the smallest rectangle
//! holding all differing pixels, with the last row cut at the last differing
//! pixel in linear order.
//!
//! 1. Find the first and last differing pixel. Packed frames whose pixel
//!    count is a whole number of comparator chunks use the bulk comparator
//!    over the flat buffer; anything else is scanned row by row, 4 pixels
//!    at a time.
//! 2. Contract the left and right edges inward column by column within the
//!    changed rows.
//! 3. Optionally widen to DMA alignment.

use crate::alignment::align_columns;
use crate::compare::{pack4, WideCompare, CHUNK};
use crate::geometry::Frame;
use crate::span::{coord, Span, SpanIndex, SpanPool};

/// First and last changed pixel as `(x, y)` pairs
type Extremes = ((usize, usize), (usize, usize));

/// Emit one span bounding every differing pixel, or `None` if the frames are identical
///
/// With `dma_align` the columns are widened to 16-pixel boundaries (clamped
/// to the frame); only meaningful when the transport copies whole spans.
// Safety: CHUNK is a non-zero constant.
#[allow(clippy::arithmetic_side_effects)]
pub fn diff_bounding_box<C: WideCompare>(
    cur: Frame<'_>,
    prev: Frame<'_>,
    dma_align: bool,
    pool: &mut SpanPool,
) -> Option<SpanIndex> {
    let geometry = cur.geometry();
    debug_assert_eq!(geometry, prev.geometry());

    let linear = geometry.is_packed() && geometry.pixel_count() % CHUNK == 0;
    let ((min_x, min_y), (max_x, max_y)) = if linear {
        linear_extremes::<C>(cur, prev)?
    } else {
        row_extremes(cur, prev)?
    };

    let rows = min_y..=max_y;
    let (lo, hi) = (min_x.min(max_x), min_x.max(max_x));
    let left = (0..lo)
        .find(|&x| column_differs(cur, prev, x, rows.clone()))
        .unwrap_or(lo);
    let right = (hi.saturating_add(1)..geometry.width())
        .rev()
        .find(|&x| column_differs(cur, prev, x, rows.clone()))
        .unwrap_or(hi);

    let mut x = coord(left);
    let mut end_x = coord(right.saturating_add(1));
    let mut last_scan_end_x = coord(max_x.saturating_add(1));
    if dma_align {
        (x, end_x, last_scan_end_x) =
            align_columns(x, end_x, last_scan_end_x, coord(geometry.width()));
    }

    Some(pool.push(Span::new(
        x,
        end_x,
        coord(min_y),
        coord(max_y.saturating_add(1)),
        last_scan_end_x,
    )))
}

/// Bulk-compare the flat buffer, then refine inside the returned chunks
// Safety: pixel_count <= buffer length (Frame contract); first < n and 0 < last_end <= n
// come from the comparator contract; width > 0 (geometry validation).
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
fn linear_extremes<C: WideCompare>(cur: Frame<'_>, prev: Frame<'_>) -> Option<Extremes> {
    let geometry = cur.geometry();
    let n = geometry.pixel_count();
    let width = geometry.width();
    let (a, b) = (&cur.pixels()[..n], &prev.pixels()[..n]);

    let chunk_start = C::first_mismatch(a, b);
    if chunk_start >= n {
        return None;
    }
    let first = chunk_start
        + a[chunk_start..]
            .iter()
            .zip(&b[chunk_start..])
            .position(|(p, q)| p != q)?;

    let chunk_end = C::last_mismatch(a, b);
    let last = a[..chunk_end]
        .iter()
        .zip(&b[..chunk_end])
        .rposition(|(p, q)| p != q)?;

    Some(((first % width, first / width), (last % width, last / width)))
}

/// Scan rows top-down for the first change, then bottom-up (not above it) for the last
fn row_extremes(cur: Frame<'_>, prev: Frame<'_>) -> Option<Extremes> {
    let height = cur.geometry().height();
    let (min_y, min_x) = (0..height)
        .find_map(|y| first_changed_in_row(cur.row(y), prev.row(y)).map(|x| (y, x)))?;
    let (max_y, max_x) = (min_y..height)
        .rev()
        .find_map(|y| last_changed_in_row(cur.row(y), prev.row(y)).map(|x| (y, x)))?;
    Some(((min_x, min_y), (max_x, max_y)))
}

/// First differing column of a row, 4 pixels at a time with a scalar tail
// Safety: x + 4 <= aligned <= row length for every lane; tail indices are < len.
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
fn first_changed_in_row(cur: &[u16], prev: &[u16]) -> Option<usize> {
    let width = cur.len();
    let aligned = width & !3;
    for x in (0..aligned).step_by(4) {
        let diff = pack4(&cur[x..]) ^ pack4(&prev[x..]);
        if diff != 0 {
            return Some(x + (diff.trailing_zeros() >> 4) as usize);
        }
    }
    (aligned..width).find(|&x| cur[x] != prev[x])
}

/// Last differing column of a row: scalar tail first, then 4 pixels at a time
// Safety: as for first_changed_in_row; leading_zeros >> 4 <= 3 for a non-zero lane.
#[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
fn last_changed_in_row(cur: &[u16], prev: &[u16]) -> Option<usize> {
    let width = cur.len();
    let aligned = width & !3;
    if let Some(x) = (aligned..width).rev().find(|&x| cur[x] != prev[x]) {
        return Some(x);
    }
    for x in (0..aligned).step_by(4).rev() {
        let diff = pack4(&cur[x..]) ^ pack4(&prev[x..]);
        if diff != 0 {
            return Some(x + 3 - (diff.leading_zeros() >> 4) as usize);
        }
    }
    None
}

/// `true` if column `x` differs on any of `rows`
// Safety: x < width and every y in rows is < height, so the row slices cover x.
#[allow(clippy::indexing_slicing)]
fn column_differs(
    cur: Frame<'_>,
    prev: Frame<'_>,
    x: usize,
    mut rows: core::ops::RangeInclusive<usize>,
) -> bool {
    rows.any(|y| cur.row(y)[x] != prev.row(y)[x])
}
