//! Greedy span-list merger
//!
//! For each span `i` in list order, later spans `j` are tried against it
//! until one starts below `i`'s bottom edge (the list is sorted by `y`, so
//! nothing further down can touch `i`). `j` is absorbed into `i` when their
//! joint bounding box wastes at most `merge_threshold` unchanged pixels and,
//! with a transfer cap configured, the merged span still fits in one
//! transfer. Absorbed spans are spliced out of the list; their pool slots
//! stay allocated until the next frame.
//!
//! Quadratic in the spans of one frame. The absorption order is greedy left
//! to right and changes which spans end up adjacent, so it is kept as is.

use crate::span::{span_size, Span, SpanIndex, SpanPool};

/// Merge tuning for one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLimits {
    /// Unchanged pixels a merge may add
    pub merge_threshold: u32,
    /// Largest merged span, in bytes on the wire
    pub max_transfer_bytes: Option<u32>,
    /// Wire bytes per pixel, used with `max_transfer_bytes`
    pub bytes_per_pixel: u32,
}

impl MergeLimits {
    /// `true` when a span of `size` pixels fits in one transfer
    pub fn fits(&self, size: u32) -> bool {
        match self.max_transfer_bytes {
            Some(cap) => u64::from(size).saturating_mul(u64::from(self.bytes_per_pixel)) <= u64::from(cap),
            None => true,
        }
    }
}

/// Extents of the bounding box of `a ∪ b`, as `(x, end_x, y, end_y, last_scan_end_x)`
///
/// The merged last row keeps the `last_scan_end_x` of whichever span reaches
/// the bottom; on a tie the wider of the two.
fn union(a: &Span, b: &Span) -> (u16, u16, u16, u16, u16) {
    let end_y = a.end_y.max(b.end_y);
    let last_scan_end_x = if end_y > a.end_y {
        b.last_scan_end_x
    } else if end_y > b.end_y {
        a.last_scan_end_x
    } else {
        a.last_scan_end_x.max(b.last_scan_end_x)
    };
    (
        a.x.min(b.x),
        a.end_x.max(b.end_x),
        a.y.min(b.y),
        end_y,
        last_scan_end_x,
    )
}

/// Merge the list starting at `head` in place
// Safety: sizes are u32 and widened to i64 before subtracting, so the waste cannot overflow.
#[allow(clippy::arithmetic_side_effects)]
pub fn merge_spans(pool: &mut SpanPool, head: SpanIndex, limits: MergeLimits) {
    let mut cursor = Some(head);
    while let Some(i) = cursor {
        let mut prev = i;
        let mut candidate = pool.get(i).and_then(Span::next);
        while let Some(j) = candidate {
            let (Some(&a), Some(&b)) = (pool.get(i), pool.get(j)) else {
                break;
            };
            if b.y > a.end_y {
                break;
            }

            let (x, end_x, y, end_y, last_scan_end_x) = union(&a, &b);
            let size = span_size(x, end_x, y, end_y, last_scan_end_x);
            let wasted = i64::from(size) - i64::from(a.size) - i64::from(b.size);
            if wasted <= i64::from(limits.merge_threshold) && limits.fits(size) {
                if let Some(span) = pool.get_mut(i) {
                    span.set_extents(x, end_x, y, end_y, last_scan_end_x);
                }
                pool.unlink(prev, j);
            } else {
                prev = j;
            }
            candidate = pool.get(prev).and_then(Span::next);
        }
        cursor = pool.get(i).and_then(Span::next);
    }
}
