//! Whole-frame "diff"
//!
//! No comparison at all: one span covering the entire frame. Used when the
//! transport wants uniform full-frame DMA writes.

use crate::geometry::FrameGeometry;
use crate::span::{coord, Span, SpanIndex, SpanPool};

/// Emit a single span covering every pixel of the frame
pub fn diff_full_frame(geometry: &FrameGeometry, pool: &mut SpanPool) -> SpanIndex {
    let width = coord(geometry.width());
    let height = coord(geometry.height());
    pool.push(Span::new(0, width, 0, height, width))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_covers_whole_frame() {
        let g = FrameGeometry::new(320, 240, 656).unwrap();
        let mut pool = SpanPool::for_frame(320, 240);
        diff_full_frame(&g, &mut pool);

        let list = pool.list().unwrap();
        assert_eq!(list.len(), 1);
        let span = list.iter().next().unwrap();
        assert_eq!((span.x, span.end_x, span.y, span.end_y), (0, 320, 0, 240));
        assert_eq!(span.last_scan_end_x, 320);
        assert_eq!(span.size, 320 * 240);
        assert_eq!(span.next(), None);
    }
}
