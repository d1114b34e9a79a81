//! Hexadecimal codec. Encoding is lowercase; decoding accepts both cases.

use crate::engine::{self, LaneKernel};
use crate::error::DecodeError;
#[cfg(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64")))]
use crate::simd;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Inputs at or below this many bytes skip the vector path entirely.
const SCALAR_CUTOFF: usize = 8;

/// Encode `data` as lowercase hexadecimal.
pub fn encode_hex(data: &[u8]) -> String {
    let mut out = vec![0u8; data.len() * 2];
    encode_into(data, &mut out);
    // SAFETY: the digit table is ASCII.
    unsafe { String::from_utf8_unchecked(out) }
}

/// Decode hexadecimal, either case.
///
/// Fails with [`DecodeError::Length`] on odd-length input and with
/// [`DecodeError::Input`] at the offset of the first non-hex byte.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    let bytes = input.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::Length {
            actual: bytes.len(),
            expected: "an even length",
        });
    }

    let mut out = vec![0u8; bytes.len() / 2];
    decode_into(bytes, &mut out)?;
    Ok(out)
}

fn encode_into(data: &[u8], out: &mut [u8]) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if data.len() > SCALAR_CUTOFF {
        match simd::backend() {
            simd::Backend::Avx2 => {
                return engine::drive_infallible(&simd::x86_64::base16::Avx2Encode, data, out);
            }
            simd::Backend::Ssse3 => {
                return engine::drive_infallible(&simd::x86_64::base16::Encode, data, out);
            }
            _ => {}
        }
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    if data.len() > SCALAR_CUTOFF && simd::backend() == simd::Backend::Neon {
        return engine::drive_infallible(&simd::aarch64::base16::Encode, data, out);
    }
    engine::drive_infallible(&ScalarEncode, data, out)
}

fn decode_into(body: &[u8], out: &mut [u8]) -> Result<(), DecodeError> {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if body.len() > SCALAR_CUTOFF {
        match simd::backend() {
            simd::Backend::Avx2 => {
                return Ok(engine::drive(&simd::x86_64::base16::Avx2Decode, body, out)?);
            }
            simd::Backend::Ssse3 => {
                return Ok(engine::drive(&simd::x86_64::base16::Decode, body, out)?);
            }
            _ => {}
        }
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    if body.len() > SCALAR_CUTOFF && simd::backend() == simd::Backend::Neon {
        return Ok(engine::drive(&simd::aarch64::base16::Decode, body, out)?);
    }
    Ok(engine::drive(&ScalarDecode, body, out)?)
}

/// Map an ASCII byte to its nibble value, `None` outside `[0-9a-fA-F]`.
pub(crate) fn nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Step-relative position of the first non-hex byte in `chunk`.
#[cfg(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64")))]
pub(crate) fn first_invalid(chunk: &[u8]) -> usize {
    chunk
        .iter()
        .position(|&b| nibble(b).is_none())
        .unwrap_or(0)
}

/// Width-1 encode kernel: one byte in, two digits out.
pub(crate) struct ScalarEncode;

impl LaneKernel for ScalarEncode {
    const IN_STEP: usize = 1;
    const OUT_STEP: usize = 2;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        let b = src[idx];
        dst[out] = HEX_DIGITS[(b >> 4) as usize];
        dst[out + 1] = HEX_DIGITS[(b & 0x0F) as usize];
        Ok(())
    }
}

/// Width-1 decode kernel: two digits in, one byte out.
pub(crate) struct ScalarDecode;

impl LaneKernel for ScalarDecode {
    const IN_STEP: usize = 2;
    const OUT_STEP: usize = 1;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = b'0';

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        let hi = nibble(src[idx]).ok_or(0usize)?;
        let lo = nibble(src[idx + 1]).ok_or(1usize)?;
        dst[out] = (hi << 4) | lo;
        Ok(())
    }
}
