//! Vector hex kernels. The SSSE3 pair works 16 bytes of binary per step,
//! the AVX2 pair 32; dispatch picks whichever the machine supports.

use std::arch::x86_64::*;

use crate::engine::LaneKernel;

pub(crate) struct Encode;

impl LaneKernel for Encode {
    const IN_STEP: usize = 16;
    const OUT_STEP: usize = 32;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after ssse3 is detected.
        unsafe { encode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        Ok(())
    }
}

pub(crate) struct Decode;

impl LaneKernel for Decode {
    const IN_STEP: usize = 32;
    const OUT_STEP: usize = 16;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = b'0';

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after ssse3 is detected.
        let ok = unsafe { decode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        if ok {
            Ok(())
        } else {
            Err(crate::hex::first_invalid(&src[idx..idx + Self::IN_STEP]))
        }
    }
}

pub(crate) struct Avx2Encode;

impl LaneKernel for Avx2Encode {
    const IN_STEP: usize = 32;
    const OUT_STEP: usize = 64;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after avx2 is detected.
        unsafe { encode_step_avx2(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        Ok(())
    }
}

pub(crate) struct Avx2Decode;

impl LaneKernel for Avx2Decode {
    const IN_STEP: usize = 64;
    const OUT_STEP: usize = 32;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = b'0';

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after avx2 is detected.
        let ok = unsafe { decode_step_avx2(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        if ok {
            Ok(())
        } else {
            Err(crate::hex::first_invalid(&src[idx..idx + Self::IN_STEP]))
        }
    }
}

#[target_feature(enable = "ssse3")]
unsafe fn encode_step(src: *const u8, dst: *mut u8) {
    unsafe {
        let input = _mm_loadu_si128(src as *const __m128i);
        let lut = _mm_setr_epi8(
            b'0' as i8, b'1' as i8, b'2' as i8, b'3' as i8, b'4' as i8, b'5' as i8, b'6' as i8,
            b'7' as i8, b'8' as i8, b'9' as i8, b'a' as i8, b'b' as i8, b'c' as i8, b'd' as i8,
            b'e' as i8, b'f' as i8,
        );
        let mask = _mm_set1_epi8(0x0F);
        let hi = _mm_shuffle_epi8(lut, _mm_and_si128(_mm_srli_epi32(input, 4), mask));
        let lo = _mm_shuffle_epi8(lut, _mm_and_si128(input, mask));

        // Interleave back to digit order: hi0 lo0 hi1 lo1 ...
        _mm_storeu_si128(dst as *mut __m128i, _mm_unpacklo_epi8(hi, lo));
        _mm_storeu_si128(dst.add(16) as *mut __m128i, _mm_unpackhi_epi8(hi, lo));
    }
}

/// Digit characters back to nibble values; invalid lanes come back with the
/// sign bit set so a single movemask catches them.
#[target_feature(enable = "ssse3")]
unsafe fn char_values(chars: __m128i) -> __m128i {
    let digit = _mm_and_si128(
        _mm_cmpgt_epi8(chars, _mm_set1_epi8(b'0' as i8 - 1)),
        _mm_cmplt_epi8(chars, _mm_set1_epi8(b'9' as i8 + 1)),
    );
    let upper = _mm_and_si128(
        _mm_cmpgt_epi8(chars, _mm_set1_epi8(b'A' as i8 - 1)),
        _mm_cmplt_epi8(chars, _mm_set1_epi8(b'F' as i8 + 1)),
    );
    let lower = _mm_and_si128(
        _mm_cmpgt_epi8(chars, _mm_set1_epi8(b'a' as i8 - 1)),
        _mm_cmplt_epi8(chars, _mm_set1_epi8(b'f' as i8 + 1)),
    );
    let valid = _mm_or_si128(_mm_or_si128(digit, upper), lower);

    let offset = _mm_or_si128(
        _mm_or_si128(
            _mm_and_si128(digit, _mm_set1_epi8(0x30)),
            _mm_and_si128(upper, _mm_set1_epi8(0x37)),
        ),
        _mm_and_si128(lower, _mm_set1_epi8(0x57)),
    );
    let vals = _mm_sub_epi8(chars, offset);
    _mm_or_si128(vals, _mm_andnot_si128(valid, _mm_set1_epi8(-128)))
}

#[target_feature(enable = "ssse3")]
unsafe fn decode_step(src: *const u8, dst: *mut u8) -> bool {
    unsafe {
        let v0 = _mm_loadu_si128(src as *const __m128i);
        let v1 = _mm_loadu_si128(src.add(16) as *const __m128i);

        // Deinterleave: even positions are high digits, odd positions low.
        let split = _mm_setr_epi8(0, 2, 4, 6, 8, 10, 12, 14, 1, 3, 5, 7, 9, 11, 13, 15);
        let s0 = _mm_shuffle_epi8(v0, split);
        let s1 = _mm_shuffle_epi8(v1, split);
        let hi_chars = _mm_unpacklo_epi64(s0, s1);
        let lo_chars = _mm_unpackhi_epi64(s0, s1);

        let hi = char_values(hi_chars);
        let lo = char_values(lo_chars);
        if _mm_movemask_epi8(_mm_or_si128(hi, lo)) != 0 {
            return false;
        }

        let bytes = _mm_or_si128(_mm_slli_epi32(hi, 4), lo);
        _mm_storeu_si128(dst as *mut __m128i, bytes);
        true
    }
}

#[target_feature(enable = "avx2")]
unsafe fn encode_step_avx2(src: *const u8, dst: *mut u8) {
    unsafe {
        let input = _mm256_loadu_si256(src as *const __m256i);
        let lut = _mm256_broadcastsi128_si256(_mm_setr_epi8(
            b'0' as i8, b'1' as i8, b'2' as i8, b'3' as i8, b'4' as i8, b'5' as i8, b'6' as i8,
            b'7' as i8, b'8' as i8, b'9' as i8, b'a' as i8, b'b' as i8, b'c' as i8, b'd' as i8,
            b'e' as i8, b'f' as i8,
        ));
        let mask = _mm256_set1_epi8(0x0F);
        let hi = _mm256_shuffle_epi8(lut, _mm256_and_si256(_mm256_srli_epi32(input, 4), mask));
        let lo = _mm256_shuffle_epi8(lut, _mm256_and_si256(input, mask));

        // unpack works within 128-bit halves; permute rebuilds linear order.
        let t0 = _mm256_unpacklo_epi8(hi, lo);
        let t1 = _mm256_unpackhi_epi8(hi, lo);
        let out0 = _mm256_permute2x128_si256(t0, t1, 0x20);
        let out1 = _mm256_permute2x128_si256(t0, t1, 0x31);
        _mm256_storeu_si256(dst as *mut __m256i, out0);
        _mm256_storeu_si256(dst.add(32) as *mut __m256i, out1);
    }
}

#[target_feature(enable = "avx2")]
unsafe fn char_values_avx2(chars: __m256i) -> __m256i {
    let digit = _mm256_and_si256(
        _mm256_cmpgt_epi8(chars, _mm256_set1_epi8(b'0' as i8 - 1)),
        _mm256_cmpgt_epi8(_mm256_set1_epi8(b'9' as i8 + 1), chars),
    );
    let upper = _mm256_and_si256(
        _mm256_cmpgt_epi8(chars, _mm256_set1_epi8(b'A' as i8 - 1)),
        _mm256_cmpgt_epi8(_mm256_set1_epi8(b'F' as i8 + 1), chars),
    );
    let lower = _mm256_and_si256(
        _mm256_cmpgt_epi8(chars, _mm256_set1_epi8(b'a' as i8 - 1)),
        _mm256_cmpgt_epi8(_mm256_set1_epi8(b'f' as i8 + 1), chars),
    );
    let valid = _mm256_or_si256(_mm256_or_si256(digit, upper), lower);

    let offset = _mm256_or_si256(
        _mm256_or_si256(
            _mm256_and_si256(digit, _mm256_set1_epi8(0x30)),
            _mm256_and_si256(upper, _mm256_set1_epi8(0x37)),
        ),
        _mm256_and_si256(lower, _mm256_set1_epi8(0x57)),
    );
    let vals = _mm256_sub_epi8(chars, offset);
    _mm256_or_si256(vals, _mm256_andnot_si256(valid, _mm256_set1_epi8(-128)))
}

#[target_feature(enable = "avx2")]
unsafe fn decode_step_avx2(src: *const u8, dst: *mut u8) -> bool {
    unsafe {
        let v0 = _mm256_loadu_si256(src as *const __m256i);
        let v1 = _mm256_loadu_si256(src.add(32) as *const __m256i);

        // High digits sit in the even bytes, low digits in the odd ones;
        // packus after the epi16 mask/shift deinterleaves both at once.
        let even_mask = _mm256_set1_epi16(0x00FF);
        let hi_chars = _mm256_permute4x64_epi64(
            _mm256_packus_epi16(
                _mm256_and_si256(v0, even_mask),
                _mm256_and_si256(v1, even_mask),
            ),
            0xD8,
        );
        let lo_chars = _mm256_permute4x64_epi64(
            _mm256_packus_epi16(_mm256_srli_epi16(v0, 8), _mm256_srli_epi16(v1, 8)),
            0xD8,
        );

        let hi = char_values_avx2(hi_chars);
        let lo = char_values_avx2(lo_chars);
        if _mm256_movemask_epi8(_mm256_or_si256(hi, lo)) != 0 {
            return false;
        }

        let bytes = _mm256_or_si256(_mm256_slli_epi32(hi, 4), lo);
        _mm256_storeu_si256(dst as *mut __m256i, bytes);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::hex::{ScalarDecode, ScalarEncode};

    fn check_encode<K: LaneKernel>(kernel: &K) {
        for len in [9usize, 16, 31, 32, 33, 100, 256] {
            let data: Vec<u8> = (0..len).map(|i| (i * 59 + 1) as u8).collect();
            let mut got = vec![0u8; len * 2];
            let mut want = got.clone();
            engine::drive_infallible(kernel, &data, &mut got);
            engine::drive_infallible(&ScalarEncode, &data, &mut want);
            assert_eq!(got, want, "len {}", len);
        }
    }

    fn check_decode<K: LaneKernel>(kernel: &K) {
        let digits: Vec<u8> = b"0123456789abcdefABCDEF"
            .iter()
            .copied()
            .cycle()
            .take(300)
            .collect();
        for len in [10usize, 32, 64, 66, 128, 300] {
            let body = &digits[..len];
            let mut got = vec![0u8; len / 2];
            let mut want = got.clone();
            engine::drive(kernel, body, &mut got).unwrap();
            engine::drive(&ScalarDecode, body, &mut want).unwrap();
            assert_eq!(got, want, "len {}", len);
        }
    }

    #[test]
    fn test_ssse3_matches_scalar() {
        if !is_x86_feature_detected!("ssse3") {
            eprintln!("ssse3 not available, skipping");
            return;
        }
        check_encode(&Encode);
        check_decode(&Decode);
    }

    #[test]
    fn test_avx2_matches_scalar() {
        if !is_x86_feature_detected!("avx2") {
            eprintln!("avx2 not available, skipping");
            return;
        }
        check_encode(&Avx2Encode);
        check_decode(&Avx2Decode);
    }

    #[test]
    fn test_decode_rejects_boundary_punctuation() {
        if !is_x86_feature_detected!("ssse3") {
            eprintln!("ssse3 not available, skipping");
            return;
        }
        // ':' (after '9'), '@'/'G' (around the uppercase run), '`'/'g'
        // (around the lowercase run) must all fail the range tests.
        for bad in [b':', b'@', b'G', b'`', b'g', 0x80u8, 0xFF] {
            let mut body = vec![b'5'; 32];
            body[19] = bad;
            let mut out = vec![0u8; 16];
            let err = engine::drive(&Decode, &body, &mut out).unwrap_err();
            assert_eq!(err.offset, 19, "byte {:#04x}", bad);
        }
    }
}
