//! Configuration errors
//!
//! The per-frame diff path has no error returns: malformed buffers are a
//! caller contract violation caught by debug assertions. Everything that can
//! be rejected up front, when geometry and engine are constructed, is
//! reported here.

use thiserror_no_std::Error;

/// Rejected frame geometry or engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// Width or height does not fit a 16-bit span coordinate
    #[error("frame dimensions {width}x{height} exceed the 16-bit span coordinate range")]
    DimensionTooLarge {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// Stride is not a whole number of 16-bit pixels
    #[error("scanline stride of {stride_bytes} bytes is not a multiple of the 2-byte pixel size")]
    OddStride {
        /// Requested stride in bytes
        stride_bytes: usize,
    },

    /// Stride is shorter than one row of pixels
    #[error("scanline stride of {stride_bytes} bytes is shorter than a {min_bytes}-byte row")]
    StrideTooSmall {
        /// Requested stride in bytes
        stride_bytes: usize,
        /// Minimum stride for the requested width
        min_bytes: usize,
    },

    /// Wire pixel size of zero
    #[error("bytes per pixel must be non-zero")]
    ZeroBytesPerPixel,

    /// Transfer cap cannot hold even one pixel
    #[error("maximum transfer size of {max_transfer_bytes} bytes cannot hold a {bytes_per_pixel}-byte pixel")]
    TransferCapTooSmall {
        /// Configured cap in bytes
        max_transfer_bytes: u32,
        /// Configured wire pixel size
        bytes_per_pixel: u32,
    },
}
