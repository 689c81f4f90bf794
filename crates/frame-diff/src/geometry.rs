//! Frame geometry and borrowed pixel views
//!
//! Pixels are 16-bit (RGB565 on the wire, but the engine never looks at
//! colour). Rows may be padded: the stride is given in bytes and can exceed
//! `width * 2`.

use crate::error::ConfigError;

/// Size of one pixel in the framebuffer, in bytes
pub const BYTES_PER_PIXEL: usize = 2;

/// Width, height and scanline stride shared by the current and previous frame
///
/// Built once per call and threaded read-only through every diff strategy.
///
/// # Examples
/// ```
/// use frame_diff::FrameGeometry;
///
/// let g = FrameGeometry::new(320, 240, 640).unwrap();
/// assert!(g.is_packed());
/// assert_eq!(g.stride_pixels(), 320);
///
/// let padded = FrameGeometry::new(318, 240, 640).unwrap();
/// assert!(!padded.is_packed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameGeometry {
    width: usize,
    height: usize,
    stride_bytes: usize,
}

impl FrameGeometry {
    /// Validate and build a geometry
    ///
    /// Rejects zero dimensions, dimensions that do not fit a `u16` span
    /// coordinate, odd strides and strides shorter than one row.
    // Safety: width <= u16::MAX is checked before the multiplication, so width * 2 cannot overflow.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn new(width: usize, height: usize, stride_bytes: usize) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroDimension { width, height });
        }
        if width > usize::from(u16::MAX) || height > usize::from(u16::MAX) {
            return Err(ConfigError::DimensionTooLarge { width, height });
        }
        if stride_bytes % BYTES_PER_PIXEL != 0 {
            return Err(ConfigError::OddStride { stride_bytes });
        }
        let min_bytes = width * BYTES_PER_PIXEL;
        if stride_bytes < min_bytes {
            return Err(ConfigError::StrideTooSmall {
                stride_bytes,
                min_bytes,
            });
        }
        Ok(Self {
            width,
            height,
            stride_bytes,
        })
    }

    /// Geometry with tightly packed rows (`stride == width * 2`)
    pub fn packed(width: usize, height: usize) -> Result<Self, ConfigError> {
        Self::new(width, height, width.saturating_mul(BYTES_PER_PIXEL))
    }

    /// Frame width in pixels
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Distance between the starts of two rows, in bytes
    pub const fn stride_bytes(&self) -> usize {
        self.stride_bytes
    }

    /// Distance between the starts of two rows, in pixels
    // Safety: division by a non-zero constant.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn stride_pixels(&self) -> usize {
        self.stride_bytes / BYTES_PER_PIXEL
    }

    /// Number of visible pixels (`width * height`)
    // Safety: both dimensions are <= u16::MAX, so the product fits in usize on 32-bit+ targets.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// `true` when rows are not padded
    // Safety: width <= u16::MAX (validated in new), so width * 2 cannot overflow.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn is_packed(&self) -> bool {
        self.stride_bytes == self.width * BYTES_PER_PIXEL
    }

    /// Index of the first pixel of row `y`
    // Safety: callers pass y < height; y * stride is bounded by the buffer length.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn row_start(&self, y: usize) -> usize {
        y * self.stride_pixels()
    }

    /// Shortest pixel buffer that holds every visible pixel
    ///
    /// The last row does not need its padding.
    // Safety: height >= 1 (validated in new), so height - 1 cannot underflow.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn min_buffer_len(&self) -> usize {
        self.row_start(self.height - 1) + self.width
    }
}

/// A read-only 16-bit framebuffer paired with its geometry
///
/// The engine never copies or swaps frames; ownership stays with the caller.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pixels: &'a [u16],
    geometry: FrameGeometry,
}

impl<'a> Frame<'a> {
    /// Wrap a pixel buffer
    ///
    /// The buffer must hold at least [`FrameGeometry::min_buffer_len`] pixels.
    /// This is a caller contract checked only in debug builds.
    pub fn new(pixels: &'a [u16], geometry: FrameGeometry) -> Self {
        debug_assert!(
            pixels.len() >= geometry.min_buffer_len(),
            "framebuffer shorter than its declared geometry"
        );
        Self { pixels, geometry }
    }

    /// Geometry of this frame
    pub const fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// The whole backing buffer, padding included
    pub const fn pixels(&self) -> &'a [u16] {
        self.pixels
    }

    /// Visible pixels of row `y` (padding excluded)
    // Safety: Frame::new guarantees (debug) that every row start + width lies inside the buffer.
    #[allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
    pub fn row(&self, y: usize) -> &'a [u16] {
        let start = self.geometry.row_start(y);
        &self.pixels[start..start + self.geometry.width()]
    }

    /// Pixel at `(x, y)`, or `None` outside the visible area
    // Safety: x < width and y < height are checked first; the index is inside row y.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x < self.geometry.width() && y < self.geometry.height() {
            self.pixels.get(self.geometry.row_start(y) + x).copied()
        } else {
            None
        }
    }
}

/// Which scanlines a diff call covers
///
/// An interlaced update scans one field (every other row); the two fields
/// are refreshed on alternating passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interlace {
    /// Every row
    #[default]
    Progressive,
    /// Rows 0, 2, 4, ...
    EvenField,
    /// Rows 1, 3, 5, ...
    OddField,
}

impl Interlace {
    /// Build from the flag pair used at the display-driver boundary
    ///
    /// `parity` is only consulted when `interlaced` is set.
    // Safety: modulo by a non-zero constant.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn from_flags(interlaced: bool, parity: usize) -> Self {
        match (interlaced, parity % 2) {
            (false, _) => Self::Progressive,
            (true, 0) => Self::EvenField,
            (true, _) => Self::OddField,
        }
    }

    /// `true` for either field
    pub const fn is_interlaced(&self) -> bool {
        !matches!(self, Self::Progressive)
    }

    /// First scanned row
    pub const fn first_row(&self) -> usize {
        match self {
            Self::Progressive | Self::EvenField => 0,
            Self::OddField => 1,
        }
    }

    /// Row increment between scanned rows
    pub const fn row_step(&self) -> usize {
        if self.is_interlaced() {
            2
        } else {
            1
        }
    }

    /// Iterator over the scanned rows of a frame `height` rows tall
    pub fn rows(&self, height: usize) -> impl Iterator<Item = usize> {
        (self.first_row()..height).step_by(self.row_step())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn test_geometry_rejects_bad_input() {
        assert_eq!(
            FrameGeometry::new(0, 10, 0),
            Err(ConfigError::ZeroDimension {
                width: 0,
                height: 10
            })
        );
        assert_eq!(
            FrameGeometry::new(10, 10, 19),
            Err(ConfigError::OddStride { stride_bytes: 19 })
        );
        assert_eq!(
            FrameGeometry::new(10, 10, 18),
            Err(ConfigError::StrideTooSmall {
                stride_bytes: 18,
                min_bytes: 20
            })
        );
        assert!(matches!(
            FrameGeometry::new(70_000, 10, 140_000),
            Err(ConfigError::DimensionTooLarge { .. })
        ));
    }

    #[test]
    fn test_padded_geometry() {
        let g = FrameGeometry::new(6, 3, 16).unwrap();
        assert_eq!(g.stride_pixels(), 8);
        assert!(!g.is_packed());
        assert_eq!(g.row_start(2), 16);
        // Last row needs no padding
        assert_eq!(g.min_buffer_len(), 22);
        assert_eq!(g.pixel_count(), 18);
    }

    #[test]
    fn test_frame_row_and_pixel() {
        let g = FrameGeometry::new(3, 2, 8).unwrap();
        let buf: Vec<u16> = vec![1, 2, 3, 0xAA, 4, 5, 6];
        let frame = Frame::new(&buf, g);
        assert_eq!(frame.row(0), &[1, 2, 3]);
        assert_eq!(frame.row(1), &[4, 5, 6]);
        assert_eq!(frame.pixel(2, 1), Some(6));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
    }

    #[test]
    fn test_interlace_rows() {
        let rows: Vec<usize> = Interlace::Progressive.rows(4).collect();
        assert_eq!(rows, vec![0, 1, 2, 3]);
        let rows: Vec<usize> = Interlace::EvenField.rows(5).collect();
        assert_eq!(rows, vec![0, 2, 4]);
        let rows: Vec<usize> = Interlace::OddField.rows(5).collect();
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(Interlace::from_flags(true, 3), Interlace::OddField);
        assert_eq!(Interlace::from_flags(false, 1), Interlace::Progressive);
    }
}
