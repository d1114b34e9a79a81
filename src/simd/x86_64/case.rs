//! SSE2 ASCII case-flip kernel: 16 bytes per step, 1:1.

use std::arch::x86_64::*;

use crate::engine::LaneKernel;

/// Flips bit 5 of every byte inside `LO..=HI`, leaves the rest alone.
/// Multi-byte UTF-8 sequences pass through untouched because their bytes
/// sit above the ASCII range.
pub(crate) struct CaseFlip<const LO: u8, const HI: u8>;

impl<const LO: u8, const HI: u8> LaneKernel for CaseFlip<LO, HI> {
    const IN_STEP: usize = 16;
    const OUT_STEP: usize = 16;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: sse2 is part of the x86_64 baseline; bounds asserted above.
        unsafe { flip_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out), LO, HI) };
        Ok(())
    }
}

#[target_feature(enable = "sse2")]
unsafe fn flip_step(src: *const u8, dst: *mut u8, lo: u8, hi: u8) {
    unsafe {
        let v = _mm_loadu_si128(src as *const __m128i);
        // Signed compares: bytes >= 0x80 read as negative and fail the
        // lower bound, which is what we want for UTF-8 continuation bytes.
        let in_range = _mm_and_si128(
            _mm_cmpgt_epi8(v, _mm_set1_epi8(lo as i8 - 1)),
            _mm_cmplt_epi8(v, _mm_set1_epi8(hi as i8 + 1)),
        );
        let flipped = _mm_xor_si128(v, _mm_and_si128(in_range, _mm_set1_epi8(0x20)));
        _mm_storeu_si128(dst as *mut __m128i, flipped);
    }
}
