//! Dirty spans and the preallocated span pool
//!
//! A [`Span`] is a rectangle whose last row may be shorter than the others:
//!
//! ```text
//!   x                 end_x
//!   ┌─────────────────┐   y
//!   │                 │
//!   │                 │
//!   ├──────────┬──────┘   end_y - 1   (last row ends at last_scan_end_x)
//!   └──────────┘
//!   x          last_scan_end_x
//! ```
//!
//! Spans live in a [`SpanPool`] allocated once for the largest frame and
//! reused every frame. The per-frame list is threaded through the pool by
//! index (`next`), in non-decreasing `y` order; the merger only ever splices
//! nodes out of it.

use alloc::vec::Vec;

/// Position of a span inside its [`SpanPool`]
pub type SpanIndex = u32;

/// Pixel count of a span with a ragged last row
///
/// `(end_x - x) * (end_y - y - 1) + (last_scan_end_x - x)`
// Safety: callers uphold x <= last_scan_end_x <= end_x and y < end_y, so no subtraction
// underflows; all operands are u16, so the u32 product and sum cannot overflow.
#[allow(clippy::arithmetic_side_effects)]
pub const fn span_size(x: u16, end_x: u16, y: u16, end_y: u16, last_scan_end_x: u16) -> u32 {
    (end_x - x) as u32 * (end_y - y - 1) as u32 + (last_scan_end_x - x) as u32
}

/// Narrow a pixel coordinate to the 16-bit span range
///
/// Geometry validation keeps every coordinate within `u16`; saturation only
/// guards against a caller breaking that contract.
pub(crate) fn coord(v: usize) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// A dirty rectangle `[x, end_x) × [y, end_y)` whose last row ends at `last_scan_end_x`
///
/// `size` always equals [`span_size`] of the extents; use [`Span::set_extents`]
/// rather than writing the coordinates one by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Span {
    /// Left edge (inclusive) of every row
    pub x: u16,
    /// Right edge (exclusive) of every row but the last
    pub end_x: u16,
    /// Top row (inclusive)
    pub y: u16,
    /// Bottom edge (exclusive)
    pub end_y: u16,
    /// Right edge (exclusive) of the last row only
    pub last_scan_end_x: u16,
    /// Covered pixel count
    pub size: u32,
    next: Option<SpanIndex>,
}

impl Span {
    /// Span with explicit extents
    pub const fn new(x: u16, end_x: u16, y: u16, end_y: u16, last_scan_end_x: u16) -> Self {
        debug_assert!(x <= end_x && y < end_y && x <= last_scan_end_x && last_scan_end_x <= end_x);
        Self {
            x,
            end_x,
            y,
            end_y,
            last_scan_end_x,
            size: span_size(x, end_x, y, end_y, last_scan_end_x),
            next: None,
        }
    }

    /// Single-row span `[x, end_x)` on row `y`
    // Safety: y is a row index < height <= u16::MAX, so y + 1 cannot overflow.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn row(x: u16, end_x: u16, y: u16) -> Self {
        Self::new(x, end_x, y, y + 1, end_x)
    }

    /// Replace all extents and recompute `size`
    pub fn set_extents(&mut self, x: u16, end_x: u16, y: u16, end_y: u16, last_scan_end_x: u16) {
        let next = self.next;
        *self = Self::new(x, end_x, y, end_y, last_scan_end_x);
        self.next = next;
    }

    /// Following span in the frame's list
    pub const fn next(&self) -> Option<SpanIndex> {
        self.next
    }

    /// Number of rows touched
    // Safety: y < end_y is a type invariant.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn rows(&self) -> u16 {
        self.end_y - self.y
    }

    /// `true` when pixel `(px, py)` is covered
    pub fn contains(&self, px: u16, py: u16) -> bool {
        if py < self.y || py >= self.end_y || px < self.x {
            return false;
        }
        if py.saturating_add(1) == self.end_y {
            px < self.last_scan_end_x
        } else {
            px < self.end_x
        }
    }
}

/// Preallocated arena of spans, reused every frame
///
/// Capacity is fixed at construction. Each diff call clears the pool and
/// appends into it without reallocating; a returned [`SpanList`] borrows
/// the pool, so it must be consumed before the next call.
#[derive(Debug, Clone)]
pub struct SpanPool {
    spans: Vec<Span>,
}

impl SpanPool {
    /// Pool holding up to `capacity` spans
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spans: Vec::with_capacity(capacity),
        }
    }

    /// Pool sized for the worst case of a `max_width × max_height` frame
    ///
    /// Alternating changed/unchanged pixels give `ceil(width / 2)` spans per
    /// row when nothing can be merged.
    pub fn for_frame(max_width: usize, max_height: usize) -> Self {
        Self::with_capacity(Self::worst_case_spans(max_width, max_height))
    }

    /// Worst-case span count of one frame
    pub fn worst_case_spans(width: usize, height: usize) -> usize {
        width.div_ceil(2).saturating_mul(height).max(1)
    }

    /// Number of spans the pool holds without reallocating
    pub fn capacity(&self) -> usize {
        self.spans.capacity()
    }

    /// Spans written by the last diff call (merged-out slots included)
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// `true` when the last diff call wrote nothing
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Forget the previous frame's spans, keeping the allocation
    pub(crate) fn clear(&mut self) {
        self.spans.clear();
    }

    /// Append a span and link it after the previously appended one
    // Safety: len < capacity (debug-asserted) and capacity fits SpanIndex for any
    // frame with 16-bit dimensions; the previous slot exists when len > 0.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    pub(crate) fn push(&mut self, mut span: Span) -> SpanIndex {
        debug_assert!(
            self.spans.len() < self.spans.capacity(),
            "span pool undersized for this frame"
        );
        let index = self.spans.len() as SpanIndex;
        span.next = None;
        if let Some(last) = self.spans.last_mut() {
            last.next = Some(index);
        }
        self.spans.push(span);
        index
    }

    pub(crate) fn get(&self, index: SpanIndex) -> Option<&Span> {
        self.spans.get(index as usize)
    }

    pub(crate) fn get_mut(&mut self, index: SpanIndex) -> Option<&mut Span> {
        self.spans.get_mut(index as usize)
    }

    /// Splice `removed` out of the list; `prev` must currently point at it
    pub(crate) fn unlink(&mut self, prev: SpanIndex, removed: SpanIndex) {
        let after = self.get(removed).and_then(Span::next);
        if let Some(p) = self.get_mut(prev) {
            debug_assert_eq!(p.next, Some(removed));
            p.next = after;
        }
    }

    /// Head of the current frame's list, if anything was written
    pub fn head(&self) -> Option<SpanIndex> {
        if self.spans.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    /// Borrow the current frame's list
    pub fn list(&self) -> Option<SpanList<'_>> {
        self.head().map(|head| self.list_from(head))
    }

    /// Borrow the list starting at `head`
    pub(crate) fn list_from(&self, head: SpanIndex) -> SpanList<'_> {
        SpanList {
            spans: &self.spans,
            head,
        }
    }
}

/// The spans of one frame, borrowed from the pool
///
/// Iteration follows the `next` links, so it yields spans in non-decreasing
/// `y` order and skips slots the merger absorbed.
#[derive(Debug, Clone, Copy)]
pub struct SpanList<'a> {
    spans: &'a [Span],
    head: SpanIndex,
}

impl<'a> SpanList<'a> {
    /// Index of the first span
    pub const fn head(&self) -> SpanIndex {
        self.head
    }

    /// Walk the list
    pub fn iter(&self) -> SpanIter<'a> {
        SpanIter {
            spans: self.spans,
            cursor: Some(self.head),
        }
    }

    /// Number of live spans
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always `false`: an empty diff is reported as `None`, never as an empty list
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Sum of span sizes (pixels that will be sent)
    pub fn total_size(&self) -> u64 {
        self.iter().map(|s| u64::from(s.size)).sum()
    }
}

impl<'a> IntoIterator for &SpanList<'a> {
    type Item = &'a Span;
    type IntoIter = SpanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`SpanList`]
#[derive(Debug, Clone)]
pub struct SpanIter<'a> {
    spans: &'a [Span],
    cursor: Option<SpanIndex>,
}

impl<'a> Iterator for SpanIter<'a> {
    type Item = &'a Span;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.spans.get(self.cursor? as usize)?;
        self.cursor = span.next;
        Some(span)
    }
}
