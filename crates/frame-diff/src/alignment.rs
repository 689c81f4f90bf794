//! DMA alignment for whole-span transfers
//!
//! When every span is copied by DMA, widening it to 16-pixel (32-byte)
//! column boundaries lets each row start and end on a cache line.

/// Column alignment for DMA-copied spans, in pixels (32 bytes of RGB565)
pub const DMA_ALIGNMENT: u16 = 16;

/// Align a column down to the nearest multiple of [`DMA_ALIGNMENT`]
///
/// # Examples
/// ```
/// # use frame_diff::alignment::align_down;
/// assert_eq!(align_down(0), 0);
/// assert_eq!(align_down(15), 0);
/// assert_eq!(align_down(16), 16);
/// assert_eq!(align_down(37), 32);
/// ```
// Safety: DMA_ALIGNMENT = 16; (value / 16) * 16 <= value, cannot overflow u16.
#[allow(clippy::arithmetic_side_effects)]
pub const fn align_down(value: u16) -> u16 {
    (value / DMA_ALIGNMENT) * DMA_ALIGNMENT
}

/// Align a column up to the nearest multiple of [`DMA_ALIGNMENT`], saturating at `u16::MAX`
///
/// # Examples
/// ```
/// # use frame_diff::alignment::align_up;
/// assert_eq!(align_up(0), 0);
/// assert_eq!(align_up(1), 16);
/// assert_eq!(align_up(16), 16);
/// assert_eq!(align_up(17), 32);
/// ```
// Safety: the widened u32 value is at most u16::MAX + 15, and is clamped before narrowing.
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub const fn align_up(value: u16) -> u16 {
    let wide = (value as u32).div_ceil(DMA_ALIGNMENT as u32) * DMA_ALIGNMENT as u32;
    if wide > u16::MAX as u32 {
        u16::MAX
    } else {
        wide as u16
    }
}

/// Check whether a column is DMA-aligned
// Safety: modulo by a non-zero constant.
#[allow(clippy::arithmetic_side_effects)]
pub const fn is_aligned(value: u16) -> bool {
    value % DMA_ALIGNMENT == 0
}

/// Widen a span's columns outward to DMA boundaries, clamped to the frame width
///
/// Returns `(x, end_x, last_scan_end_x)`.
pub fn align_columns(x: u16, end_x: u16, last_scan_end_x: u16, frame_width: u16) -> (u16, u16, u16) {
    (
        align_down(x),
        align_up(end_x).min(frame_width),
        align_up(last_scan_end_x).min(frame_width),
    )
}
