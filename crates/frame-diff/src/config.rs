//! Diff strategy selection and link cost tuning
//!
//! The merge threshold comes from a simple cost model of the display link:
//! every new span pays a fixed overhead (flushing the controller FIFO and
//! re-sending the address window) that is worth a few pixels of payload. A
//! gap of unchanged pixels shorter than that is cheaper to send than to
//! skip.
//!
//! # Example
//!
//! ```
//! use frame_diff::{DiffConfig, DiffStrategy, LinkProfile};
//!
//! let config = DiffConfig::for_link(LinkProfile::Spi16Bit);
//! assert_eq!(config.strategy, DiffStrategy::Scanline);
//! assert_eq!(config.merge_threshold, 10);
//!
//! // 8 bytes of restart overhead on a 2-byte-per-pixel link
//! assert_eq!(frame_diff::config::merge_threshold_for(8, 2), 4);
//! ```

use crate::error::ConfigError;
use crate::geometry::BYTES_PER_PIXEL;

// Safety: BYTES_PER_PIXEL = 2.
#[allow(clippy::cast_possible_truncation)]
const WIRE_BYTES_PER_PIXEL: u32 = BYTES_PER_PIXEL as u32;

/// Merge threshold for a link where restarting a transfer costs `restart_overhead_bytes`
///
/// Returns 0 for a zero `bytes_per_pixel`.
pub const fn merge_threshold_for(restart_overhead_bytes: u32, bytes_per_pixel: u32) -> u32 {
    match restart_overhead_bytes.checked_div(bytes_per_pixel) {
        Some(pixels) => pixels,
        None => 0,
    }
}

/// How changed regions are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DiffStrategy {
    /// Resend the whole frame on any change
    FullFrame,
    /// One span around every change
    BoundingBox,
    /// Per-row spans, merged across rows when progressive
    #[default]
    Scanline,
}

impl DiffStrategy {
    /// Short lowercase name for logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FullFrame => "full-frame",
            Self::BoundingBox => "bounding-box",
            Self::Scanline => "scanline",
        }
    }
}

/// Known display links and the merge threshold each one warrants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LinkProfile {
    /// 8-bit SPI (ILI9341, ST7789 and most small panels)
    Spi8Bit,
    /// HX8357D over SPI, whose window commands are longer
    Hx8357d,
    /// 16-bit parallel or 16-bit SPI bus
    Spi16Bit,
    /// Every transfer goes through DMA; span setup dominates
    DmaOnly,
}

impl LinkProfile {
    /// Every profile, in increasing threshold order
    pub const ALL: [Self; 4] = [Self::Spi8Bit, Self::Hx8357d, Self::Spi16Bit, Self::DmaOnly];

    /// Bytes of dead time spent closing one span and opening the next
    pub const fn restart_overhead_bytes(&self) -> u32 {
        match self {
            Self::Spi8Bit => 8,
            Self::Hx8357d => 12,
            Self::Spi16Bit => 20,
            Self::DmaOnly => 640,
        }
    }

    /// Unchanged pixels worth sending instead of starting a new span
    pub const fn merge_threshold(&self) -> u32 {
        merge_threshold_for(self.restart_overhead_bytes(), WIRE_BYTES_PER_PIXEL)
    }

    /// Short lowercase name, as accepted on the command line
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Spi8Bit => "spi8",
            Self::Hx8357d => "hx8357d",
            Self::Spi16Bit => "spi16",
            Self::DmaOnly => "dma",
        }
    }

    /// Look a profile up by [`LinkProfile::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Engine configuration
///
/// Fixed for the lifetime of a [`crate::DiffEngine`]. The presets cover the
/// usual setups; build one with struct update syntax to change a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiffConfig {
    /// Strategy used for every frame
    pub strategy: DiffStrategy,
    /// Use the 4-pixel scanline diff when width and stride allow it
    pub coarse_scanlines: bool,
    /// Contiguous unchanged pixels below which it is cheaper to include them
    /// in the current span than to close it and later open a new one
    pub merge_threshold: u32,
    /// Largest span the merger may produce, in wire bytes
    pub max_transfer_bytes: Option<u32>,
    /// Wire bytes per pixel (used with `max_transfer_bytes`)
    pub bytes_per_pixel: u32,
    /// Widen bounding-box columns to 16-pixel DMA boundaries
    pub dma_align: bool,
}

impl DiffConfig {
    /// Exact scanline diff tuned for 8-bit SPI
    pub const DEFAULT: Self = Self {
        strategy: DiffStrategy::Scanline,
        coarse_scanlines: false,
        merge_threshold: LinkProfile::Spi8Bit.merge_threshold(),
        max_transfer_bytes: None,
        bytes_per_pixel: WIRE_BYTES_PER_PIXEL,
        dma_align: false,
    };

    /// Coarse 4-pixel scanline diff where the geometry allows it
    pub const FAST: Self = Self {
        coarse_scanlines: true,
        ..Self::DEFAULT
    };

    /// Every change resends the whole frame over DMA
    pub const DMA_FULL_FRAME: Self = Self {
        strategy: DiffStrategy::FullFrame,
        merge_threshold: LinkProfile::DmaOnly.merge_threshold(),
        ..Self::DEFAULT
    };

    /// One DMA-aligned rectangle around every change
    pub const DMA_BOUNDING_BOX: Self = Self {
        strategy: DiffStrategy::BoundingBox,
        merge_threshold: LinkProfile::DmaOnly.merge_threshold(),
        dma_align: true,
        ..Self::DEFAULT
    };

    /// Scanline diff with the threshold of a known link
    pub const fn for_link(profile: LinkProfile) -> Self {
        Self {
            merge_threshold: profile.merge_threshold(),
            ..Self::DEFAULT
        }
    }

    /// Cap merged spans at `max_transfer_bytes` on the wire
    pub const fn with_max_transfer(self, max_transfer_bytes: u32) -> Self {
        Self {
            max_transfer_bytes: Some(max_transfer_bytes),
            ..self
        }
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bytes_per_pixel == 0 {
            return Err(ConfigError::ZeroBytesPerPixel);
        }
        if let Some(max_transfer_bytes) = self.max_transfer_bytes {
            if max_transfer_bytes < self.bytes_per_pixel {
                return Err(ConfigError::TransferCapTooSmall {
                    max_transfer_bytes,
                    bytes_per_pixel: self.bytes_per_pixel,
                });
            }
        }
        Ok(())
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
