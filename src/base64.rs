//! RFC 4648 base64 codec, standard alphabet with `=` padding.
//!
//! Encoding expands every 3 input bytes to 4 symbols; decoding contracts 4
//! symbols to 3 bytes. Both directions run through the bulk-transform engine
//! with either the vector kernels (12:16 / 16:12 per step) or the width-1
//! scalar kernels below.

use crate::engine::{self, LaneKernel};
use crate::error::DecodeError;
#[cfg(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64")))]
use crate::simd;

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

/// Inputs at or below this many bytes skip the vector path entirely.
const SCALAR_CUTOFF: usize = 16;

/// Encode `data` as standard base64 with `=` padding.
pub fn encode_base64(data: &[u8]) -> String {
    let mut out = vec![0u8; data.len().div_ceil(3) * 4];
    encode_into(data, &mut out);

    // The tail step emits 'A' symbols for the missing input bytes; patch the
    // padding positions afterwards, once.
    let n = out.len();
    match data.len() % 3 {
        1 => {
            out[n - 2] = PAD;
            out[n - 1] = PAD;
        }
        2 => out[n - 1] = PAD,
        _ => {}
    }

    // SAFETY: the alphabet and padding character are ASCII.
    unsafe { String::from_utf8_unchecked(out) }
}

/// Decode standard base64, strict RFC 4648.
///
/// Fails with [`DecodeError::Length`] when the input is not a multiple of 4
/// characters, and with [`DecodeError::Input`] at the absolute offset of the
/// first byte outside the alphabet — including an `=` anywhere but the final
/// one or two positions.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, DecodeError> {
    let bytes = input.as_bytes();
    if bytes.len() % 4 != 0 {
        return Err(DecodeError::Length {
            actual: bytes.len(),
            expected: "a multiple of 4",
        });
    }
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    // At most two trailing '=' count as padding; any further '=' is left in
    // the body and rejected there as an invalid symbol.
    let padding = bytes
        .iter()
        .rev()
        .take(2)
        .take_while(|&&b| b == PAD)
        .count();
    let body = &bytes[..bytes.len() - padding];

    let mut out = vec![0u8; bytes.len() / 4 * 3 - padding];
    decode_into(body, &mut out)?;
    Ok(out)
}

fn encode_into(data: &[u8], out: &mut [u8]) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if data.len() > SCALAR_CUTOFF && simd::backend() != simd::Backend::Scalar {
        return engine::drive_infallible(&simd::x86_64::base64::Encode, data, out);
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    if data.len() > SCALAR_CUTOFF && simd::backend() == simd::Backend::Neon {
        return engine::drive_infallible(&simd::aarch64::base64::Encode, data, out);
    }
    engine::drive_infallible(&ScalarEncode, data, out)
}

fn decode_into(body: &[u8], out: &mut [u8]) -> Result<(), DecodeError> {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if body.len() > SCALAR_CUTOFF && simd::backend() != simd::Backend::Scalar {
        return Ok(engine::drive(&simd::x86_64::base64::Decode, body, out)?);
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    if body.len() > SCALAR_CUTOFF && simd::backend() == simd::Backend::Neon {
        return Ok(engine::drive(&simd::aarch64::base64::Decode, body, out)?);
    }
    Ok(engine::drive(&ScalarDecode, body, out)?)
}

/// Map an ASCII byte to its 6-bit value, `None` outside the alphabet.
pub(crate) fn sextet(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Step-relative position of the first invalid symbol in `chunk`.
///
/// Cold path shared by the vector kernels: they detect *that* a chunk is
/// invalid with a range test and leave *where* to this scan.
#[cfg(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) fn first_invalid(chunk: &[u8]) -> usize {
    chunk
        .iter()
        .position(|&b| sextet(b).is_none())
        .unwrap_or(0)
}

/// Width-1 encode kernel: one 3-byte group per step.
pub(crate) struct ScalarEncode;

impl LaneKernel for ScalarEncode {
    const IN_STEP: usize = 3;
    const OUT_STEP: usize = 4;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        let v = (u32::from(src[idx]) << 16)
            | (u32::from(src[idx + 1]) << 8)
            | u32::from(src[idx + 2]);
        dst[out] = ALPHABET[(v >> 18) as usize & 0x3F];
        dst[out + 1] = ALPHABET[(v >> 12) as usize & 0x3F];
        dst[out + 2] = ALPHABET[(v >> 6) as usize & 0x3F];
        dst[out + 3] = ALPHABET[v as usize & 0x3F];
        Ok(())
    }
}

/// Width-1 decode kernel: one 4-symbol group per step.
pub(crate) struct ScalarDecode;

impl LaneKernel for ScalarDecode {
    const IN_STEP: usize = 4;
    const OUT_STEP: usize = 3;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = b'A';

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        let mut v = 0u32;
        for i in 0..4 {
            match sextet(src[idx + i]) {
                Some(s) => v = (v << 6) | u32::from(s),
                None => return Err(i),
            }
        }
        dst[out] = (v >> 16) as u8;
        dst[out + 1] = (v >> 8) as u8;
        dst[out + 2] = v as u8;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    #[test]
    fn test_encode_known_values() {
        let cases: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];
        for (input, expected) in cases {
            assert_eq!(encode_base64(input), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_base64("Zg==").unwrap(), b"f");
        assert_eq!(decode_base64("Zm8=").unwrap(), b"fo");
        assert_eq!(decode_base64("Zm9v").unwrap(), b"foo");
        assert_eq!(decode_base64("").unwrap(), b"");
    }

    #[test]
    fn test_round_trip_all_lengths() {
        for len in 0..100usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + 13) as u8).collect();
            let encoded = encode_base64(&data);
            assert_eq!(encoded.len(), len.div_ceil(3) * 4);
            let decoded = decode_base64(&encoded).unwrap();
            assert_eq!(decoded, data, "round trip failed at length {}", len);
        }
    }

    #[test]
    fn test_decoded_length_formula() {
        for len in 0..100usize {
            let data = vec![0x5Au8; len];
            let encoded = encode_base64(&data);
            let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count();
            assert!(padding <= 2);
            assert_eq!(encoded.len() / 4 * 3 - padding, len);
        }
    }

    #[test]
    fn test_invalid_character_offset() {
        let err = decode_base64("Z g=").unwrap_err();
        assert_eq!(
            err,
            DecodeError::Input(crate::error::InputError::new(1, b' '))
        );
    }

    #[test]
    fn test_invalid_character_past_first_chunk() {
        // 20 full symbols then an invalid one; exercises the vector path's
        // chunk-base offset translation on machines that take it.
        let mut s = encode_base64(&[0xAB; 18]); // 24 symbols, no padding
        assert_eq!(s.len(), 24);
        s.replace_range(21..22, "!");
        let err = decode_base64(&s).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Input(crate::error::InputError::new(21, b'!'))
        );
    }

    #[test]
    fn test_stray_padding_rejected() {
        // '=' before the final padding positions is a content error.
        let err = decode_base64("Zg=a").unwrap_err();
        assert!(matches!(err, DecodeError::Input(e) if e.offset == 2 && e.byte == b'='));

        let err = decode_base64("====").unwrap_err();
        assert!(matches!(err, DecodeError::Input(e) if e.offset == 0 && e.byte == b'='));
    }

    #[test]
    fn test_length_error() {
        assert!(matches!(
            decode_base64("Zg="),
            Err(DecodeError::Length { actual: 3, .. })
        ));
        assert!(matches!(
            decode_base64("Zg"),
            Err(DecodeError::Length { actual: 2, .. })
        ));
    }

    #[test]
    fn test_scalar_kernels_match_public_api() {
        // The public API may dispatch to a vector backend; the width-1
        // kernels are the reference it must agree with byte for byte.
        for len in [0usize, 1, 2, 3, 15, 16, 17, 31, 32, 33, 63, 64, 65, 200] {
            let data: Vec<u8> = (0..len).map(|i| (i * 31 + 7) as u8).collect();

            let mut scalar = vec![0u8; len.div_ceil(3) * 4];
            engine::drive_infallible(&ScalarEncode, &data, &mut scalar);
            let n = scalar.len();
            match len % 3 {
                1 => {
                    scalar[n - 2] = b'=';
                    scalar[n - 1] = b'=';
                }
                2 => scalar[n - 1] = b'=',
                _ => {}
            }
            assert_eq!(encode_base64(&data).as_bytes(), &scalar[..], "len {}", len);
        }
    }
}
