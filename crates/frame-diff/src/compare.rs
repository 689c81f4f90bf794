//! Bulk framebuffer comparison
//!
//! Locates the first or last differing pixel of two equally long pixel runs
//! at 8-pixel (128-bit) chunk granularity, 16 pixels (one 32-byte cache line
//! of each buffer) per loop iteration, prefetching ahead of the scan. Callers
//! refine the chunk-aligned result to the exact pixel themselves.
//!
//! ## Contract
//!
//! | Function | Returns | No difference |
//! |----------|---------|---------------|
//! | [`WideCompare::first_mismatch`] | start index of the first differing chunk | `len` |
//! | [`WideCompare::last_mismatch`] | exclusive end index of the last differing chunk | `0` |
//!
//! Both inputs must be at least `len` pixels long, where `len` is the shorter
//! length rounded down to a multiple of [`CHUNK`]; trailing pixels beyond
//! that are not scanned.

/// Pixels compared as one unit
pub const CHUNK: usize = 8;

/// Pixels consumed per unrolled loop iteration
pub const UNROLL: usize = 2 * CHUNK;

/// How far ahead of the scan position to prefetch, in pixels (128 bytes)
pub const PREFETCH_AHEAD: usize = 64;

/// Chunk-granular first/last mismatch search
///
/// One implementation per target; the set is closed, so the engine picks one
/// statically through [`NativeCompare`].
pub trait WideCompare {
    /// Start of the first differing 8-pixel chunk, or the scanned length if none differ
    fn first_mismatch(cur: &[u16], prev: &[u16]) -> usize;

    /// End of the last differing 8-pixel chunk, or `0` if none differ
    fn last_mismatch(cur: &[u16], prev: &[u16]) -> usize;
}

/// Comparator used by the engine on this target
#[cfg(target_arch = "x86_64")]
pub type NativeCompare = Sse2Compare;

/// Comparator used by the engine on this target
#[cfg(not(target_arch = "x86_64"))]
pub type NativeCompare = PortableCompare;

/// Scanned length: the common prefix rounded down to whole chunks
// Safety: modulo by a non-zero constant; the result is <= the input.
#[allow(clippy::arithmetic_side_effects)]
fn scan_len(cur: &[u16], prev: &[u16]) -> usize {
    let len = cur.len().min(prev.len());
    len - len % CHUNK
}

/// Four pixels as one little-endian-ordered 64-bit lane (pixel 0 in the low bits)
///
/// Bit-scanning the XOR of two lanes gives the pixel offset: trailing zeros
/// `>> 4` is the first differing pixel, leading zeros `>> 4` counts unchanged
/// pixels from the top.
// Safety: debug-asserted len >= 4; shifts are by constants below 64.
#[inline(always)]
#[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
pub(crate) fn pack4(p: &[u16]) -> u64 {
    debug_assert!(p.len() >= 4);
    u64::from(p[0]) | u64::from(p[1]) << 16 | u64::from(p[2]) << 32 | u64::from(p[3]) << 48
}

/// Portable comparator: two 64-bit XOR-and-test lanes per chunk
///
/// Prefetching is left to the hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableCompare;

impl PortableCompare {
    // Safety: callers pass offset + CHUNK <= len of both slices.
    #[inline(always)]
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    fn chunk_differs(cur: &[u16], prev: &[u16], offset: usize) -> bool {
        let a = &cur[offset..offset + CHUNK];
        let b = &prev[offset..offset + CHUNK];
        ((pack4(a) ^ pack4(b)) | (pack4(&a[4..]) ^ pack4(&b[4..]))) != 0
    }
}

impl WideCompare for PortableCompare {
    // Safety: i + UNROLL <= len and i + CHUNK <= len are checked by the loop conditions.
    #[allow(clippy::arithmetic_side_effects)]
    fn first_mismatch(cur: &[u16], prev: &[u16]) -> usize {
        let len = scan_len(cur, prev);
        let mut i = 0;
        while i + UNROLL <= len {
            if Self::chunk_differs(cur, prev, i) {
                return i;
            }
            if Self::chunk_differs(cur, prev, i + CHUNK) {
                return i + CHUNK;
            }
            i += UNROLL;
        }
        if i + CHUNK <= len && Self::chunk_differs(cur, prev, i) {
            return i;
        }
        len
    }

    // Safety: end >= UNROLL / end >= CHUNK are checked before subtracting.
    #[allow(clippy::arithmetic_side_effects)]
    fn last_mismatch(cur: &[u16], prev: &[u16]) -> usize {
        let mut end = scan_len(cur, prev);
        while end >= UNROLL {
            if Self::chunk_differs(cur, prev, end - CHUNK) {
                return end;
            }
            if Self::chunk_differs(cur, prev, end - UNROLL) {
                return end - CHUNK;
            }
            end -= UNROLL;
        }
        if end >= CHUNK && Self::chunk_differs(cur, prev, end - CHUNK) {
            return end;
        }
        0
    }
}

/// SSE2 comparator: one 128-bit compare per chunk with `prefetcht0` ahead of the scan
///
/// SSE2 is part of the x86_64 baseline, so no runtime detection is needed.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Sse2Compare;

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use core::arch::x86_64::{
        __m128i, _mm_cmpeq_epi16, _mm_loadu_si128, _mm_movemask_epi8, _mm_prefetch, _MM_HINT_T0,
    };

    /// `true` when the 8 pixels at `a` and `b` are identical
    ///
    /// # Safety
    /// Both pointers must have 8 readable `u16` behind them.
    #[inline(always)]
    pub(super) unsafe fn chunk_equal(a: *const u16, b: *const u16) -> bool {
        // SAFETY: caller guarantees 16 readable bytes at each pointer; loadu has no alignment requirement.
        let (va, vb) = unsafe { (_mm_loadu_si128(a.cast::<__m128i>()), _mm_loadu_si128(b.cast::<__m128i>())) };
        // SAFETY: SSE2 is always available on x86_64.
        unsafe { _mm_movemask_epi8(_mm_cmpeq_epi16(va, vb)) == 0xFFFF }
    }

    /// Hint the next cache lines of both buffers into L1
    #[inline(always)]
    pub(super) fn prefetch(a: *const u16, b: *const u16) {
        // SAFETY: prefetch is a hint and never faults, even for addresses outside the buffer.
        unsafe {
            _mm_prefetch::<_MM_HINT_T0>(a.cast::<i8>());
            _mm_prefetch::<_MM_HINT_T0>(b.cast::<i8>());
        }
    }
}

#[cfg(target_arch = "x86_64")]
impl WideCompare for Sse2Compare {
    // Safety: loop conditions keep i + UNROLL (or i + CHUNK) <= len <= both slice lengths.
    #[allow(clippy::arithmetic_side_effects)]
    fn first_mismatch(cur: &[u16], prev: &[u16]) -> usize {
        let len = scan_len(cur, prev);
        let (pc, pp) = (cur.as_ptr(), prev.as_ptr());
        let mut i = 0;
        while i + UNROLL <= len {
            sse2::prefetch(pc.wrapping_add(i + PREFETCH_AHEAD), pp.wrapping_add(i + PREFETCH_AHEAD));
            // SAFETY: i + UNROLL <= len, so both chunks at i and i + CHUNK are in bounds.
            unsafe {
                if !sse2::chunk_equal(pc.add(i), pp.add(i)) {
                    return i;
                }
                if !sse2::chunk_equal(pc.add(i + CHUNK), pp.add(i + CHUNK)) {
                    return i + CHUNK;
                }
            }
            i += UNROLL;
        }
        // SAFETY: i + CHUNK <= len is checked first.
        if i + CHUNK <= len && !unsafe { sse2::chunk_equal(pc.add(i), pp.add(i)) } {
            return i;
        }
        len
    }

    // Safety: end >= UNROLL / end >= CHUNK are checked before subtracting.
    #[allow(clippy::arithmetic_side_effects)]
    fn last_mismatch(cur: &[u16], prev: &[u16]) -> usize {
        let mut end = scan_len(cur, prev);
        let (pc, pp) = (cur.as_ptr(), prev.as_ptr());
        while end >= UNROLL {
            sse2::prefetch(
                pc.wrapping_add(end).wrapping_sub(PREFETCH_AHEAD),
                pp.wrapping_add(end).wrapping_sub(PREFETCH_AHEAD),
            );
            // SAFETY: end <= len and end >= UNROLL, so both chunks below end are in bounds.
            unsafe {
                if !sse2::chunk_equal(pc.add(end - CHUNK), pp.add(end - CHUNK)) {
                    return end;
                }
                if !sse2::chunk_equal(pc.add(end - UNROLL), pp.add(end - UNROLL)) {
                    return end - CHUNK;
                }
            }
            end -= UNROLL;
        }
        // SAFETY: end >= CHUNK is checked first.
        if end >= CHUNK && !unsafe { sse2::chunk_equal(pc.add(end - CHUNK), pp.add(end - CHUNK)) } {
            return end;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn naive_first(a: &[u16], b: &[u16]) -> Option<usize> {
        a.iter().zip(b).position(|(x, y)| x != y)
    }

    fn naive_last(a: &[u16], b: &[u16]) -> Option<usize> {
        a.iter().zip(b).rposition(|(x, y)| x != y)
    }

    fn check_contract<C: WideCompare>(len: usize, changed: &[usize]) {
        let prev: Vec<u16> = (0..len).map(|i| (i * 7) as u16).collect();
        let mut cur = prev.clone();
        for &i in changed {
            cur[i] ^= 0x0100;
        }

        let first = C::first_mismatch(&cur, &prev);
        let last = C::last_mismatch(&cur, &prev);
        match (naive_first(&cur, &prev), naive_last(&cur, &prev)) {
            (Some(f), Some(l)) => {
                assert_eq!(first, f - f % CHUNK, "first chunk for {changed:?}");
                assert_eq!(last, l - l % CHUNK + CHUNK, "last chunk end for {changed:?}");
            }
            _ => {
                assert_eq!(first, len);
                assert_eq!(last, 0);
            }
        }
    }

    fn exercise<C: WideCompare>() {
        for len in [8, 16, 24, 64, 200] {
            check_contract::<C>(len, &[]);
            check_contract::<C>(len, &[0]);
            check_contract::<C>(len, &[len - 1]);
            check_contract::<C>(len, &[len / 2]);
            check_contract::<C>(len, &[3, len - 5]);
            // Only the high pixel of a lane changes
            check_contract::<C>(len, &[7]);
        }
    }

    #[test]
    fn test_portable_contract() {
        exercise::<PortableCompare>();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_sse2_contract() {
        exercise::<Sse2Compare>();
    }

    #[test]
    fn test_native_matches_portable() {
        let prev = vec![0u16; 320];
        let mut cur = prev.clone();
        cur[101] = 1;
        cur[250] = 1;
        assert_eq!(
            NativeCompare::first_mismatch(&cur, &prev),
            PortableCompare::first_mismatch(&cur, &prev)
        );
        assert_eq!(
            NativeCompare::last_mismatch(&cur, &prev),
            PortableCompare::last_mismatch(&cur, &prev)
        );
    }

    #[test]
    fn test_trailing_partial_chunk_is_ignored() {
        let prev = vec![0u16; 12];
        let mut cur = prev.clone();
        cur[10] = 1;
        assert_eq!(PortableCompare::first_mismatch(&cur, &prev), 8);
        assert_eq!(PortableCompare::last_mismatch(&cur, &prev), 0);
    }

    #[test]
    fn test_pack4_lane_order() {
        let lane = pack4(&[0x0001, 0x0002, 0x0003, 0x0004]);
        assert_eq!(lane, 0x0004_0003_0002_0001);
        let diff = pack4(&[0, 0, 5, 0]) ^ pack4(&[0, 0, 0, 0]);
        assert_eq!(diff.trailing_zeros() >> 4, 2);
        assert_eq!(diff.leading_zeros() >> 4, 1);
    }
}
