//! NEON hex kernels, 16 bytes of binary per step. `zip`/`uzp` do the digit
//! interleaving that the x86 kernels spell as unpack and shuffle.

use std::arch::aarch64::*;

use crate::engine::LaneKernel;

const HEX_LUT: [u8; 16] = *b"0123456789abcdef";

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
        // SAFETY: dispatched only after neon is detected.
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
        // SAFETY: dispatched only after neon is detected.
        let ok = unsafe { decode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        if ok {
            Ok(())
        } else {
            Err(crate::hex::first_invalid(&src[idx..idx + Self::IN_STEP]))
        }
    }
}

#[target_feature(enable = "neon")]
unsafe fn encode_step(src: *const u8, dst: *mut u8) {
    unsafe {
        let input = vld1q_u8(src);
        let lut = vld1q_u8(HEX_LUT.as_ptr());
        let hi = vqtbl1q_u8(lut, vshrq_n_u8(input, 4));
        let lo = vqtbl1q_u8(lut, vandq_u8(input, vdupq_n_u8(0x0F)));

        vst1q_u8(dst, vzip1q_u8(hi, lo));
        vst1q_u8(dst.add(16), vzip2q_u8(hi, lo));
    }
}

/// Digit characters back to nibble values, plus a validity mask (0xFF per
/// valid lane).
#[target_feature(enable = "neon")]
unsafe fn char_values(chars: uint8x16_t) -> (uint8x16_t, uint8x16_t) {
    let digit = vandq_u8(
        vcgeq_u8(chars, vdupq_n_u8(b'0')),
        vcleq_u8(chars, vdupq_n_u8(b'9')),
    );
    let upper = vandq_u8(
        vcgeq_u8(chars, vdupq_n_u8(b'A')),
        vcleq_u8(chars, vdupq_n_u8(b'F')),
    );
    let lower = vandq_u8(
        vcgeq_u8(chars, vdupq_n_u8(b'a')),
        vcleq_u8(chars, vdupq_n_u8(b'f')),
    );
    let valid = vorrq_u8(vorrq_u8(digit, upper), lower);

    let offset = vorrq_u8(
        vorrq_u8(
            vandq_u8(digit, vdupq_n_u8(0x30)),
            vandq_u8(upper, vdupq_n_u8(0x37)),
        ),
        vandq_u8(lower, vdupq_n_u8(0x57)),
    );
    (vsubq_u8(chars, offset), valid)
}

#[target_feature(enable = "neon")]
unsafe fn decode_step(src: *const u8, dst: *mut u8) -> bool {
    unsafe {
        let v0 = vld1q_u8(src);
        let v1 = vld1q_u8(src.add(16));

        // Even positions are high digits, odd positions low.
        let hi_chars = vuzp1q_u8(v0, v1);
        let lo_chars = vuzp2q_u8(v0, v1);

        let (hi, hi_valid) = char_values(hi_chars);
        let (lo, lo_valid) = char_values(lo_chars);
        if vminvq_u8(vandq_u8(hi_valid, lo_valid)) == 0 {
            return false;
        }

        vst1q_u8(dst, vorrq_u8(vshlq_n_u8(hi, 4), lo));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::hex::{ScalarDecode, ScalarEncode};

    #[test]
    fn test_encode_matches_scalar() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("neon not available, skipping");
            return;
        }
        for len in [9usize, 16, 31, 32, 33, 100, 256] {
            let data: Vec<u8> = (0..len).map(|i| (i * 59 + 1) as u8).collect();
            let mut got = vec![0u8; len * 2];
            let mut want = got.clone();
            engine::drive_infallible(&Encode, &data, &mut got);
            engine::drive_infallible(&ScalarEncode, &data, &mut want);
            assert_eq!(got, want, "len {}", len);
        }
    }

    #[test]
    fn test_decode_matches_scalar() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("neon not available, skipping");
            return;
        }
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
            engine::drive(&Decode, body, &mut got).unwrap();
            engine::drive(&ScalarDecode, body, &mut want).unwrap();
            assert_eq!(got, want, "len {}", len);
        }
    }

    #[test]
    fn test_decode_rejects_boundary_punctuation() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("neon not available, skipping");
            return;
        }
        for bad in [b':', b'@', b'G', b'`', b'g', 0x80u8, 0xFF] {
            let mut body = vec![b'5'; 32];
            body[19] = bad;
            let mut out = vec![0u8; 16];
            let err = engine::drive(&Decode, &body, &mut out).unwrap_err();
            assert_eq!(err.offset, 19, "byte {:#04x}", bad);
        }
    }
}
