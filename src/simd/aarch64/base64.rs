//! NEON base64 kernels, 12 bytes in / 16 symbols out per step.
//!
//! Same split-multiply-translate scheme as the x86 kernels; the 16-bit
//! high-multiply has no single NEON instruction and is built from
//! `vmull`/`vshrn`, and every shuffle becomes a `tbl`.

use std::arch::aarch64::*;

use crate::engine::LaneKernel;

pub(crate) struct Encode;

impl LaneKernel for Encode {
    const IN_STEP: usize = 12;
    const OUT_STEP: usize = 16;
    const OVERREAD: usize = 4;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        debug_assert!(idx + Self::IN_STEP + Self::OVERREAD <= src.len());
        debug_assert!(out + Self::OUT_STEP <= dst.len());
        // SAFETY: dispatched only after neon is detected.
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
        // SAFETY: dispatched only after neon is detected.
        let ok = unsafe { decode_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out)) };
        if ok {
            Ok(())
        } else {
            Err(crate::base64::first_invalid(&src[idx..idx + Self::IN_STEP]))
        }
    }
}

/// Unsigned 16-bit high multiply, lane by lane.
#[target_feature(enable = "neon")]
unsafe fn mulhi_u16(a: uint16x8_t, b: uint16x8_t) -> uint16x8_t {
    let lo = vmull_u16(vget_low_u16(a), vget_low_u16(b));
    let hi = vmull_u16(vget_high_u16(a), vget_high_u16(b));
    vcombine_u16(vshrn_n_u32(lo, 16), vshrn_n_u32(hi, 16))
}

#[target_feature(enable = "neon")]
unsafe fn encode_step(src: *const u8, dst: *mut u8) {
    unsafe {
        let input = vld1q_u8(src);

        // Spread each 3-byte group across a 32-bit lane, bytes duplicated.
        let spread: [u8; 16] = [1, 0, 2, 1, 4, 3, 5, 4, 7, 6, 8, 7, 10, 9, 11, 10];
        let shuf = vqtbl1q_u8(input, vld1q_u8(spread.as_ptr()));

        let shuf16 = vreinterpretq_u16_u8(shuf);
        let mask_ac = vreinterpretq_u16_u32(vdupq_n_u32(0x0FC0_FC00));
        let mask_bd = vreinterpretq_u16_u32(vdupq_n_u32(0x003F_03F0));
        let mul_ac = vreinterpretq_u16_u32(vdupq_n_u32(0x0400_0040));
        let mul_bd = vreinterpretq_u16_u32(vdupq_n_u32(0x0100_0010));

        let t1 = mulhi_u16(vandq_u16(shuf16, mask_ac), mul_ac);
        let t3 = vmulq_u16(vandq_u16(shuf16, mask_bd), mul_bd);
        let indices = vreinterpretq_u8_u16(vorrq_u16(t1, t3));

        // Per-byte offset from sextet value to ASCII symbol.
        let lut: [u8; 16] = [65, 71, 252, 252, 252, 252, 252, 252, 252, 252, 252, 252, 237, 240, 0, 0];
        let gt25 = vcgtq_s8(vreinterpretq_s8_u8(indices), vdupq_n_s8(25));
        let offsets = vsubq_u8(vqsubq_u8(indices, vdupq_n_u8(51)), gt25);
        let ascii = vaddq_u8(indices, vqtbl1q_u8(vld1q_u8(lut.as_ptr()), offsets));

        vst1q_u8(dst, ascii);
    }
}

/// Returns false when any of the 16 symbols is outside the alphabet; `dst`
/// is only written on success.
#[target_feature(enable = "neon")]
unsafe fn decode_step(src: *const u8, dst: *mut u8) -> bool {
    unsafe {
        let input = vld1q_u8(src);

        let lut_lo: [u8; 16] = [
            0x15, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x13, 0x1A, 0x1B, 0x1B,
            0x1B, 0x1A,
        ];
        let lut_hi: [u8; 16] = [
            0x10, 0x10, 0x01, 0x02, 0x04, 0x08, 0x04, 0x08, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10,
            0x10, 0x10,
        ];
        // -65 and -71 as wrapping-add bytes.
        let lut_roll: [u8; 16] = [0, 16, 19, 4, 191, 191, 185, 185, 0, 0, 0, 0, 0, 0, 0, 0];

        let lo_nibbles = vandq_u8(input, vdupq_n_u8(0x0F));
        let hi_nibbles = vshrq_n_u8(input, 4);
        let lo = vqtbl1q_u8(vld1q_u8(lut_lo.as_ptr()), lo_nibbles);
        let hi = vqtbl1q_u8(vld1q_u8(lut_hi.as_ptr()), hi_nibbles);

        // Each alphabet class owns one bit; lo & hi is nonzero exactly for
        // the byte values no class claims.
        if vmaxvq_u8(vandq_u8(lo, hi)) != 0 {
            return false;
        }

        // '/' shares a high nibble with '+'; the eq_2f adjustment picks its
        // own roll entry.
        let eq_2f = vceqq_u8(input, vdupq_n_u8(0x2F));
        let roll = vqtbl1q_u8(vld1q_u8(lut_roll.as_ptr()), vaddq_u8(hi_nibbles, eq_2f));
        let sextets = vaddq_u8(input, roll);

        // Merge the four 6-bit values of each group into a 24-bit lane
        // value, then compact the payload bytes to the front.
        let s16 = vreinterpretq_u16_u8(sextets);
        let even = vandq_u16(s16, vdupq_n_u16(0x00FF));
        let odd = vshrq_n_u16(s16, 8);
        let merged16 = vorrq_u16(vshlq_n_u16(even, 6), odd);

        let m32 = vreinterpretq_u32_u16(merged16);
        let lo16 = vandq_u32(m32, vdupq_n_u32(0x0000_FFFF));
        let packed = vorrq_u32(vshlq_n_u32(lo16, 12), vshrq_n_u32(m32, 16));

        let compact: [u8; 16] = [2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, 255, 255, 255, 255];
        let bytes = vqtbl1q_u8(vreinterpretq_u8_u32(packed), vld1q_u8(compact.as_ptr()));

        // A full-vector store would clobber 4 bytes past the step's output.
        let mut buf = [0u8; 16];
        vst1q_u8(buf.as_mut_ptr(), bytes);
        std::ptr::copy_nonoverlapping(buf.as_ptr(), dst, 12);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64::{ScalarDecode, ScalarEncode};
    use crate::engine;

    #[test]
    fn test_encode_matches_scalar() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("neon not available, skipping");
            return;
        }
        for len in [12usize, 17, 48, 100, 255, 257] {
            let data: Vec<u8> = (0..len).map(|i| (i * 137 + 11) as u8).collect();
            let mut got = vec![0u8; len.div_ceil(3) * 4];
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
        let symbols: Vec<u8> = (0u8..=255)
            .filter(|&b| crate::base64::sextet(b).is_some())
            .cycle()
            .take(256)
            .collect();
        for len in [16usize, 18, 20, 64, 100, 256] {
            let body = &symbols[..len];
            let out_len = len / 4 * 3 + if len % 4 > 0 { len % 4 - 1 } else { 0 };
            let mut got = vec![0u8; out_len];
            let mut want = got.clone();
            engine::drive(&Decode, body, &mut got).unwrap();
            engine::drive(&ScalarDecode, body, &mut want).unwrap();
            assert_eq!(got, want, "len {}", len);
        }
    }

    #[test]
    fn test_decode_reports_chunk_relative_offset() {
        if !std::arch::is_aarch64_feature_detected!("neon") {
            eprintln!("neon not available, skipping");
            return;
        }
        let mut body = vec![b'Q'; 32];
        body[21] = b'%';
        let mut out = vec![0u8; 24];
        let err = engine::drive(&Decode, &body, &mut out).unwrap_err();
        assert_eq!(err.offset, 21);
        assert_eq!(err.byte, b'%');
    }
}
