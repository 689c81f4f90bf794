//! Diff orchestration
//!
//! [`DiffEngine`] owns the span pool and the configuration, and runs one
//! strategy per frame:
//!
//! | Strategy | Output |
//! |----------|--------|
//! | [`DiffStrategy::FullFrame`] | one span covering the frame |
//! | [`DiffStrategy::BoundingBox`] | one span around every change |
//! | [`DiffStrategy::Scanline`] | per-row spans (coarse or exact), merged when progressive |
//!
//! The returned [`SpanList`] borrows the engine, so the spans of one frame
//! must be consumed before the next call.

use crate::bbox::diff_bounding_box;
use crate::compare::NativeCompare;
use crate::config::{DiffConfig, DiffStrategy};
use crate::error::ConfigError;
use crate::full_frame::diff_full_frame;
use crate::geometry::{Frame, FrameGeometry, Interlace};
use crate::merge::{merge_spans, MergeLimits};
use crate::scanline::{coarse_compatible, diff_scanlines_coarse, diff_scanlines_exact};
use crate::span::{SpanIndex, SpanList, SpanPool};

/// Totals of one frame's spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiffStats {
    /// Live spans in the list
    pub span_count: usize,
    /// Pixels the spans cover (changed plus bridged)
    pub dirty_pixels: u64,
}

impl DiffStats {
    /// Count a list
    pub fn from_list(list: &SpanList<'_>) -> Self {
        list.iter().fold(Self::default(), |acc, span| Self {
            span_count: acc.span_count.saturating_add(1),
            dirty_pixels: acc.dirty_pixels.saturating_add(u64::from(span.size)),
        })
    }

    /// Payload bytes on a link carrying `bytes_per_pixel` per pixel
    pub fn wire_bytes(&self, bytes_per_pixel: u32) -> u64 {
        self.dirty_pixels.saturating_mul(u64::from(bytes_per_pixel))
    }
}

/// Frame differ with a preallocated span pool
///
/// Created once for the largest frame it will see; every
/// [`compute_diff`](Self::compute_diff) call reuses the same pool.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    pool: SpanPool,
    config: DiffConfig,
    max_width: usize,
    max_height: usize,
}

impl DiffEngine {
    /// Allocate the span pool for frames up to `max_width × max_height`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for zero or out-of-range dimensions and for a
    /// configuration that fails [`DiffConfig::validate`].
    pub fn new(max_width: usize, max_height: usize, config: DiffConfig) -> Result<Self, ConfigError> {
        FrameGeometry::packed(max_width, max_height)?;
        config.validate()?;

        let pool = SpanPool::for_frame(max_width, max_height);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "diff engine: {}x{}, {} span slots, strategy {}",
            max_width,
            max_height,
            pool.capacity(),
            config.strategy.name()
        );
        #[cfg(feature = "tracing")]
        tracing::info!(
            max_width,
            max_height,
            pool_capacity = pool.capacity(),
            strategy = config.strategy.name(),
            merge_threshold = config.merge_threshold,
            "Diff engine initialized"
        );

        Ok(Self {
            pool,
            config,
            max_width,
            max_height,
        })
    }

    /// Configuration fixed at construction
    pub const fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Widest frame the pool is sized for
    pub const fn max_width(&self) -> usize {
        self.max_width
    }

    /// Tallest frame the pool is sized for
    pub const fn max_height(&self) -> usize {
        self.max_height
    }

    /// Span slots available per frame
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Describe what changed between `prev` and `cur`
    ///
    /// Returns `None` when nothing needs to be sent: `changed` is false, or
    /// the strategy found no differing pixel. Both frames must share one
    /// geometry no larger than the engine was created for. With an
    /// interlaced field only that field's rows are scanned (scanline
    /// strategy) and the spans are not merged across rows.
    pub fn compute_diff(
        &mut self,
        cur: Frame<'_>,
        prev: Frame<'_>,
        changed: bool,
        interlace: Interlace,
    ) -> Option<SpanList<'_>> {
        self.pool.clear();
        if !changed {
            return None;
        }

        let geometry = cur.geometry();
        debug_assert_eq!(geometry, prev.geometry(), "frames must share one geometry");
        debug_assert!(
            geometry.width() <= self.max_width && geometry.height() <= self.max_height,
            "frame larger than the span pool was sized for"
        );

        let head = match self.config.strategy {
            DiffStrategy::FullFrame => Some(diff_full_frame(&geometry, &mut self.pool)),
            DiffStrategy::BoundingBox => {
                diff_bounding_box::<NativeCompare>(cur, prev, self.config.dma_align, &mut self.pool)
            }
            DiffStrategy::Scanline => self.diff_scanlines(cur, prev, interlace),
        };
        let list = head.map(|head| self.pool.list_from(head));

        #[cfg(any(feature = "defmt", feature = "tracing"))]
        {
            let stats = list.as_ref().map(DiffStats::from_list).unwrap_or_default();
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "diff ({}): {} spans, {} px",
                self.config.strategy.name(),
                stats.span_count,
                stats.dirty_pixels
            );
            #[cfg(feature = "tracing")]
            tracing::trace!(
                strategy = self.config.strategy.name(),
                spans = stats.span_count,
                dirty_pixels = stats.dirty_pixels,
                "Frame diffed"
            );
        }

        list
    }

    fn diff_scanlines(&mut self, cur: Frame<'_>, prev: Frame<'_>, interlace: Interlace) -> Option<SpanIndex> {
        let head = if self.config.coarse_scanlines && coarse_compatible(&cur.geometry()) {
            diff_scanlines_coarse(cur, prev, interlace, &mut self.pool)
        } else {
            diff_scanlines_exact(cur, prev, interlace, self.config.merge_threshold, &mut self.pool)
        }?;

        if !interlace.is_interlaced() {
            let limits = self.merge_limits();
            merge_spans(&mut self.pool, head, limits);
        }
        Some(head)
    }

    fn merge_limits(&self) -> MergeLimits {
        MergeLimits {
            merge_threshold: self.config.merge_threshold,
            max_transfer_bytes: self.config.max_transfer_bytes,
            bytes_per_pixel: self.config.bytes_per_pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    use super::*;
    use crate::span::Span;
    use alloc::vec;
    use alloc::vec::Vec;

    fn diff(
        config: DiffConfig,
        width: usize,
        height: usize,
        stride_px: usize,
        changed: &[(usize, usize)],
        interlace: Interlace,
    ) -> Vec<Span> {
        let g = FrameGeometry::new(width, height, stride_px * 2).unwrap();
        let prev = vec![0u16; stride_px * height];
        let mut cur = prev.clone();
        for &(x, y) in changed {
            cur[y * stride_px + x] = 0x001F;
        }
        let mut engine = DiffEngine::new(width, height, config).unwrap();
        engine
            .compute_diff(Frame::new(&cur, g), Frame::new(&prev, g), true, interlace)
            .map(|list| list.iter().copied().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            DiffEngine::new(0, 240, DiffConfig::DEFAULT),
            Err(ConfigError::ZeroDimension { .. })
        ));
        assert!(matches!(
            DiffEngine::new(320, 240, DiffConfig::DEFAULT.with_max_transfer(1)),
            Err(ConfigError::TransferCapTooSmall { .. })
        ));
        let engine = DiffEngine::new(320, 240, DiffConfig::FAST).unwrap();
        assert_eq!(engine.max_width(), 320);
        assert_eq!(engine.max_height(), 240);
        assert!(engine.pool_capacity() >= 160 * 240);
        assert_eq!(engine.config(), &DiffConfig::FAST);
    }

    #[test]
    fn test_unchanged_flag_short_circuits_every_strategy() {
        let g = FrameGeometry::packed(8, 4).unwrap();
        let prev = vec![0u16; 32];
        let cur = vec![1u16; 32];
        for config in [DiffConfig::DEFAULT, DiffConfig::DMA_FULL_FRAME, DiffConfig::DMA_BOUNDING_BOX] {
            let mut engine = DiffEngine::new(8, 4, config).unwrap();
            let out = engine.compute_diff(Frame::new(&cur, g), Frame::new(&prev, g), false, Interlace::Progressive);
            assert!(out.is_none());
        }
    }

    #[test]
    fn test_full_frame_ignores_content() {
        let spans = diff(DiffConfig::DMA_FULL_FRAME, 8, 4, 8, &[], Interlace::Progressive);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].size, 32);
    }

    #[test]
    fn test_bounding_box_dispatch() {
        let config = DiffConfig {
            dma_align: false,
            ..DiffConfig::DMA_BOUNDING_BOX
        };
        let spans = diff(config, 16, 8, 16, &[(2, 1), (9, 5)], Interlace::Progressive);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].x, spans[0].end_x, spans[0].y, spans[0].end_y), (2, 10, 1, 6));
        assert!(diff(config, 16, 8, 16, &[], Interlace::Progressive).is_empty());
    }

    #[test]
    fn test_scanline_rows_are_merged_when_progressive() {
        let column: Vec<(usize, usize)> = (0..4).map(|y| (3, y)).collect();
        let spans = diff(DiffConfig::DEFAULT, 8, 4, 8, &column, Interlace::Progressive);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].x, spans[0].end_x, spans[0].y, spans[0].end_y, spans[0].size), (3, 4, 0, 4, 4));
    }

    #[test]
    fn test_interlaced_field_stays_row_exact() {
        let column: Vec<(usize, usize)> = (0..4).map(|y| (3, y)).collect();
        let spans = diff(DiffConfig::DEFAULT, 8, 4, 8, &column, Interlace::OddField);
        let rows: Vec<u16> = spans.iter().map(|s| s.y).collect();
        assert_eq!(rows, [1, 3]);
        assert!(spans.iter().all(|s| s.rows() == 1));
    }

    #[test]
    fn test_coarse_only_when_geometry_allows() {
        // Coarse closes an open span at the row end; exact stops at the pixel
        let coarse = diff(DiffConfig::FAST, 8, 4, 8, &[(5, 2)], Interlace::Progressive);
        assert_eq!((coarse[0].x, coarse[0].end_x), (5, 8));
        // 11-pixel stride (22 bytes) is not a multiple of 8 bytes: exact fallback
        let exact = diff(DiffConfig::FAST, 8, 4, 11, &[(5, 2)], Interlace::Progressive);
        assert_eq!((exact[0].x, exact[0].end_x), (5, 6));
    }

    #[test]
    fn test_stats() {
        let g = FrameGeometry::packed(8, 4).unwrap();
        let prev = vec![0u16; 32];
        let mut cur = prev.clone();
        cur[0] = 1;
        cur[7 + 3 * 8] = 1;
        let mut engine = DiffEngine::new(8, 4, DiffConfig::DEFAULT).unwrap();
        let list = engine
            .compute_diff(Frame::new(&cur, g), Frame::new(&prev, g), true, Interlace::Progressive)
            .unwrap();
        let stats = DiffStats::from_list(&list);
        assert_eq!(stats, DiffStats { span_count: 2, dirty_pixels: 2 });
        assert_eq!(stats.wire_bytes(2), 4);
    }

    #[test]
    fn test_pool_reused_across_frames() {
        let g = FrameGeometry::packed(8, 4).unwrap();
        let prev = vec![0u16; 32];
        let cur = vec![0xFFFFu16; 32];
        let mut engine = DiffEngine::new(8, 4, DiffConfig::DEFAULT).unwrap();
        let capacity = engine.pool_capacity();
        for _ in 0..3 {
            let list = engine
                .compute_diff(Frame::new(&cur, g), Frame::new(&prev, g), true, Interlace::Progressive)
                .unwrap();
            assert_eq!(list.total_size(), 32);
        }
        assert_eq!(engine.pool_capacity(), capacity);
        let same = engine.compute_diff(Frame::new(&prev, g), Frame::new(&prev, g), true, Interlace::Progressive);
        assert!(same.is_none());
    }
}
