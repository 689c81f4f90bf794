//! Test utilities for frame-diff
//!
//! Owned RGB565 frames with optional row padding, plus checks that a span
//! list describes a frame pair correctly.
//!
//! # Quick start
//!
//! ```
//! use frame_diff::{DiffConfig, DiffEngine, Interlace};
//! use frame_diff_testing::{assert_complete, TestFrame};
//!
//! let prev = TestFrame::new(16, 8);
//! let mut cur = prev.clone();
//! cur.fill_rect(2, 3, 4, 2, 0xF800);
//!
//! let mut engine = DiffEngine::new(16, 8, DiffConfig::DEFAULT).unwrap();
//! let spans = engine.compute_diff(cur.as_frame(), prev.as_frame(), true, Interlace::Progressive);
//! assert_complete(cur.as_frame(), prev.as_frame(), spans.as_ref(), Interlace::Progressive).unwrap();
//! ```
//!
//! The `assert_*` helpers return `Err` with a description of the first
//! violation instead of panicking, so callers can add context.

#![warn(clippy::all)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
// Testing lib: indices are bounds-checked by the frame geometry and a panic is a test failure
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects, clippy::expect_used)]

use frame_diff::{Frame, FrameGeometry, Interlace, SpanList};

pub use frame_diff::geometry::BYTES_PER_PIXEL;

/// An owned 16-bit framebuffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFrame {
    pixels: Vec<u16>,
    geometry: FrameGeometry,
}

impl TestFrame {
    /// Packed frame filled with black (0)
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_stride(width, height, width)
    }

    /// Frame whose rows are `stride_pixels` apart; padding is filled with `0xDEAD`
    ///
    /// The padding value never appears in a diff: both frames of a pair get
    /// the same padding, and a strategy that read it would still see no change.
    ///
    /// # Panics
    ///
    /// Panics if the geometry is invalid.
    pub fn with_stride(width: usize, height: usize, stride_pixels: usize) -> Self {
        let geometry = FrameGeometry::new(width, height, stride_pixels * BYTES_PER_PIXEL)
            .expect("invalid test frame geometry");
        let mut pixels = vec![0xDEAD; stride_pixels * height];
        for y in 0..height {
            let start = geometry.row_start(y);
            pixels[start..start + width].fill(0);
        }
        Self { pixels, geometry }
    }

    /// Packed frame filled with `color`
    pub fn filled(width: usize, height: usize, color: u16) -> Self {
        let mut frame = Self::new(width, height);
        frame.fill_rect(0, 0, width, height, color);
        frame
    }

    /// Geometry of this frame
    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Frame width in pixels
    pub fn width(&self) -> usize {
        self.geometry.width()
    }

    /// Frame height in pixels
    pub fn height(&self) -> usize {
        self.geometry.height()
    }

    /// Set one visible pixel
    ///
    /// # Panics
    ///
    /// Panics outside the visible area.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u16) {
        assert!(
            x < self.width() && y < self.height(),
            "pixel ({x}, {y}) outside {}x{}",
            self.width(),
            self.height()
        );
        let index = self.geometry.row_start(y) + x;
        self.pixels[index] = color;
    }

    /// Read one visible pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        self.as_frame().pixel(x, y)
    }

    /// Fill the rectangle `[x, x + w) × [y, y + h)`, clipped to the frame
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u16) {
        let x_end = (x + w).min(self.width());
        let y_end = (y + h).min(self.height());
        for row in y..y_end {
            for col in x..x_end {
                self.set_pixel(col, row, color);
            }
        }
    }

    /// Borrow as an engine frame
    pub fn as_frame(&self) -> Frame<'_> {
        Frame::new(&self.pixels, self.geometry)
    }

    /// The backing buffer, padding included
    pub fn pixels(&self) -> &[u16] {
        &self.pixels
    }
}

/// Every visible pixel that differs between the two frames, in row-major order
pub fn changed_pixels(cur: Frame<'_>, prev: Frame<'_>) -> Vec<(usize, usize)> {
    let g = cur.geometry();
    (0..g.height())
        .flat_map(|y| (0..g.width()).map(move |x| (x, y)))
        .filter(|&(x, y)| cur.pixel(x, y) != prev.pixel(x, y))
        .collect()
}

/// How many spans cover each visible pixel, row-major `width * height`
///
/// `None` (no change reported) gives an all-zero mask.
pub fn coverage_mask(spans: Option<&SpanList<'_>>, geometry: FrameGeometry) -> Vec<u32> {
    let (width, height) = (geometry.width(), geometry.height());
    let mut mask = vec![0u32; width * height];
    for span in spans.into_iter().flat_map(|list| list.iter()) {
        for y in usize::from(span.y)..usize::from(span.end_y).min(height) {
            for x in usize::from(span.x)..usize::from(span.end_x).min(width) {
                if span.contains(x as u16, y as u16) {
                    mask[y * width + x] += 1;
                }
            }
        }
    }
    mask
}

/// Every changed pixel on a scanned row is covered by some span
pub fn assert_complete(
    cur: Frame<'_>,
    prev: Frame<'_>,
    spans: Option<&SpanList<'_>>,
    interlace: Interlace,
) -> Result<(), String> {
    let g = cur.geometry();
    let mask = coverage_mask(spans, g);
    let scanned: Vec<usize> = interlace.rows(g.height()).collect();
    match changed_pixels(cur, prev)
        .into_iter()
        .filter(|(_, y)| scanned.contains(y))
        .find(|&(x, y)| mask[y * g.width() + x] == 0)
    {
        Some((x, y)) => Err(format!("changed pixel ({x}, {y}) is not covered by any span")),
        None => Ok(()),
    }
}

/// Every covered but unchanged pixel has a changed pixel within `reach` columns on its row
///
/// Only meaningful for unmerged scanline output, where spans are single
/// rows and gaps are bridged horizontally.
pub fn assert_bounded_overinclusion(
    cur: Frame<'_>,
    prev: Frame<'_>,
    spans: Option<&SpanList<'_>>,
    reach: usize,
) -> Result<(), String> {
    let g = cur.geometry();
    let mask = coverage_mask(spans, g);
    let differs = |x: usize, y: usize| cur.pixel(x, y) != prev.pixel(x, y);
    for y in 0..g.height() {
        for x in 0..g.width() {
            if mask[y * g.width() + x] == 0 || differs(x, y) {
                continue;
            }
            let lo = x.saturating_sub(reach);
            let hi = (x + reach).min(g.width() - 1);
            if !(lo..=hi).any(|nx| differs(nx, y)) {
                return Err(format!(
                    "unchanged pixel ({x}, {y}) is covered but no change lies within {reach} columns"
                ));
            }
        }
    }
    Ok(())
}

/// Spans come in non-decreasing `y` order
pub fn assert_non_decreasing_y(spans: Option<&SpanList<'_>>) -> Result<(), String> {
    let ys: Vec<u16> = spans.into_iter().flat_map(|list| list.iter().map(|s| s.y)).collect();
    match ys.windows(2).find(|w| w[1] < w[0]) {
        Some(w) => Err(format!("span at y={} follows span at y={}", w[1], w[0])),
        None => Ok(()),
    }
}

/// Every span satisfies its extent invariants and lies inside the frame
pub fn assert_within_frame(spans: Option<&SpanList<'_>>, geometry: FrameGeometry) -> Result<(), String> {
    for s in spans.into_iter().flat_map(|list| list.iter()) {
        let ordered = s.x <= s.last_scan_end_x && s.last_scan_end_x <= s.end_x && s.y < s.end_y;
        let inside = usize::from(s.end_x) <= geometry.width() && usize::from(s.end_y) <= geometry.height();
        if !ordered || !inside {
            return Err(format!("span {s:?} is malformed for a {}x{} frame", geometry.width(), geometry.height()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use frame_diff::{DiffConfig, DiffEngine};

    #[test]
    fn test_padded_frame_keeps_padding_out_of_view() {
        let mut frame = TestFrame::with_stride(3, 2, 5);
        frame.set_pixel(2, 1, 7);
        assert_eq!(frame.pixels().len(), 10);
        assert_eq!(frame.pixel(2, 1), Some(7));
        assert_eq!(frame.pixels()[3], 0xDEAD);
        assert_eq!(frame.as_frame().row(1), &[0, 0, 7]);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = TestFrame::new(4, 4);
        frame.fill_rect(2, 2, 10, 10, 1);
        assert_eq!(changed_pixels(frame.as_frame(), TestFrame::new(4, 4).as_frame()).len(), 4);
    }

    #[test]
    fn test_checks_accept_engine_output() {
        let prev = TestFrame::new(16, 8);
        let mut cur = prev.clone();
        cur.fill_rect(1, 1, 3, 3, 0xFFFF);
        cur.set_pixel(12, 6, 0x1234);
        let mut engine = DiffEngine::new(16, 8, DiffConfig::DEFAULT).unwrap();
        let spans = engine.compute_diff(cur.as_frame(), prev.as_frame(), true, Interlace::Progressive);
        assert_complete(cur.as_frame(), prev.as_frame(), spans.as_ref(), Interlace::Progressive).unwrap();
        assert_non_decreasing_y(spans.as_ref()).unwrap();
        assert_within_frame(spans.as_ref(), cur.geometry()).unwrap();
    }

    #[test]
    fn test_missing_coverage_is_reported() {
        let prev = TestFrame::new(4, 4);
        let mut cur = prev.clone();
        cur.set_pixel(1, 1, 1);
        let err = assert_complete(cur.as_frame(), prev.as_frame(), None, Interlace::Progressive).unwrap_err();
        assert!(err.contains("(1, 1)"));
        // The unscanned field does not count
        assert!(assert_complete(cur.as_frame(), prev.as_frame(), None, Interlace::EvenField).is_ok());
    }
}
