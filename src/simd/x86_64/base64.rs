//! SSSE3 base64 kernels, 12 bytes in / 16 symbols out per step.
//!
//! Alphabet translation and validation follow the nibble-lookup scheme from
//! Muła's "Base64 encoding with SIMD instructions"; the pack stage uses
//! `maddubs`/`madd` to merge sextets without shifts.

use std::arch::x86_64::*;

use crate::engine::LaneKernel;

pub(crate) struct Encode;

impl LaneKernel for Encode {
    const IN_STEP: usize = 12;
    const OUT_STEP: usize = 16;
    // The 16-byte load reaches 4 bytes past the consumed group.
    const OVERREAD: usize = 4;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP + Self::OVERREAD <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after ssse3 is detected; bounds asserted
        // above and guaranteed by the engine.
        unsafe { encode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        Ok(())
    }
}

pub(crate) struct Decode;

impl LaneKernel for Decode {
    const IN_STEP: usize = 16;
    const OUT_STEP: usize = 12;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = b'A';

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after ssse3 is detected.
        let ok = unsafe { decode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        if ok {
            Ok(())
        } else {
            // The vector path only knows *that* the chunk is bad; rescan it
            // scalar-wise for the position.
            Err(crate::base64::first_invalid(&src[idx..idx + Self::IN_STEP]))
        }
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn encode_step(src: *const u8, dst: *mut u8) {
    unsafe {
        let input = _mm_loadu_si128(src as *const __m128i);

        // Spread each 3-byte group across a 32-bit lane, bytes duplicated so
        // the multiplies below can isolate all four sextets at once.
        let shuf = _mm_shuffle_epi8(
            input,
            _mm_set_epi8(10, 11, 9, 10, 7, 8, 6, 7, 4, 5, 3, 4, 1, 2, 0, 1),
        );
        let t1 = _mm_mulhi_epu16(
            _mm_and_si128(shuf, _mm_set1_epi32(0x0FC0_FC00u32 as i32)),
            _mm_set1_epi32(0x0400_0040),
        );
        let t3 = _mm_mullo_epi16(
            _mm_and_si128(shuf, _mm_set1_epi32(0x003F_03F0)),
            _mm_set1_epi32(0x0100_0010),
        );
        let indices = _mm_or_si128(t1, t3);

        // Per-byte offset from sextet value to ASCII symbol.
        let lut = _mm_setr_epi8(65, 71, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -19, -16, 0, 0);
        let mut offsets = _mm_subs_epu8(indices, _mm_set1_epi8(51));
        offsets = _mm_sub_epi8(offsets, _mm_cmpgt_epi8(indices, _mm_set1_epi8(25)));
        let ascii = _mm_add_epi8(indices, _mm_shuffle_epi8(lut, offsets));

        _mm_storeu_si128(dst as *mut __m128i, ascii);
    }
}

/// Returns false when any of the 16 symbols is outside the alphabet; `dst`
/// is only written on success.
#[target_feature(enable = "ssse3")]
unsafe fn decode_step(src: *const u8, dst: *mut u8) -> bool {
    unsafe {
        let input = _mm_loadu_si128(src as *const __m128i);

        let lut_lo = _mm_setr_epi8(
            0x15, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x13, 0x1A, 0x1B, 0x1B,
            0x1B, 0x1A,
        );
        let lut_hi = _mm_setr_epi8(
            0x10, 0x10, 0x01, 0x02, 0x04, 0x08, 0x04, 0x08, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10,
            0x10, 0x10,
        );
        let lut_roll = _mm_setr_epi8(0, 16, 19, 4, -65, -65, -71, -71, 0, 0, 0, 0, 0, 0, 0, 0);
        let mask_2f = _mm_set1_epi8(0x2F);

        let lo_nibbles = _mm_and_si128(input, mask_2f);
        let hi_nibbles = _mm_and_si128(_mm_srli_epi32(input, 4), mask_2f);
        let lo = _mm_shuffle_epi8(lut_lo, lo_nibbles);
        let hi = _mm_shuffle_epi8(lut_hi, hi_nibbles);

        // Each alphabet class owns one bit; lo & hi is nonzero exactly for
        // the byte values no class claims.
        if _mm_movemask_epi8(_mm_cmpgt_epi8(_mm_and_si128(lo, hi), _mm_setzero_si128())) != 0 {
            return false;
        }

        // '/' shares a high nibble with '+'; the eq_2f adjustment picks its
        // own roll entry.
        let eq_2f = _mm_cmpeq_epi8(input, mask_2f);
        let roll = _mm_shuffle_epi8(lut_roll, _mm_add_epi8(eq_2f, hi_nibbles));
        let sextets = _mm_add_epi8(input, roll);

        // Merge four 6-bit values per lane into three bytes, then compact
        // the 12 payload bytes to the front.
        let merged = _mm_maddubs_epi16(sextets, _mm_set1_epi32(0x0140_0140));
        let packed = _mm_madd_epi16(merged, _mm_set1_epi32(0x0001_1000));
        let packed = _mm_shuffle_epi8(
            packed,
            _mm_setr_epi8(2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, -1, -1, -1, -1),
        );

        // A 16-byte store would clobber 4 bytes past the step's output.
        let mut buf = [0u8; 16];
        _mm_storeu_si128(buf.as_mut_ptr() as *mut __m128i, packed);
        std::ptr::copy_nonoverlapping(buf.as_ptr(), dst, 12);
        true
    }
}
