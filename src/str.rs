//! ASCII string helpers. Case conversion runs through the same bulk engine
//! as the codecs with a 1:1 kernel; split, join, and trim are plain slice
//! work.

use crate::engine::{self, LaneKernel};
#[cfg(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64")))]
use crate::simd;

/// Inputs at or below this many bytes skip the vector path entirely.
const SCALAR_CUTOFF: usize = 16;

/// Uppercase the ASCII letters of `s`; everything else, including multi-byte
/// UTF-8 sequences, passes through unchanged.
pub fn str_to_upper(s: &str) -> String {
    flip_case::<b'a', b'z'>(s)
}

/// Lowercase the ASCII letters of `s`.
pub fn str_to_lower(s: &str) -> String {
    flip_case::<b'A', b'Z'>(s)
}

fn flip_case<const LO: u8, const HI: u8>(s: &str) -> String {
    let data = s.as_bytes();
    let mut out = vec![0u8; data.len()];

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if data.len() > SCALAR_CUTOFF && simd::backend() != simd::Backend::Scalar {
        engine::drive_infallible(&simd::x86_64::case::CaseFlip::<LO, HI>, data, &mut out);
        // SAFETY: only ASCII letters were altered, so `out` is valid UTF-8.
        return unsafe { String::from_utf8_unchecked(out) };
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    if data.len() > SCALAR_CUTOFF && simd::backend() == simd::Backend::Neon {
        engine::drive_infallible(&simd::aarch64::case::CaseFlip::<LO, HI>, data, &mut out);
        // SAFETY: only ASCII letters were altered, so `out` is valid UTF-8.
        return unsafe { String::from_utf8_unchecked(out) };
    }

    engine::drive_infallible(&ScalarCase::<LO, HI>, data, &mut out);
    // SAFETY: only ASCII letters were altered, so `out` is valid UTF-8.
    unsafe { String::from_utf8_unchecked(out) }
}

struct ScalarCase<const LO: u8, const HI: u8>;

impl<const LO: u8, const HI: u8> LaneKernel for ScalarCase<LO, HI> {
    const IN_STEP: usize = 1;
    const OUT_STEP: usize = 1;
    const OVERREAD: usize = 0;
    const TAIL_FILL: u8 = 0;

    #[inline]
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize> {
        let b = src[idx];
        dst[out] = if (LO..=HI).contains(&b) { b ^ 0x20 } else { b };
        Ok(())
    }
}

/// Split `s` on occurrences of `delim`, optionally trimming ASCII whitespace
/// from each piece. Empty pieces are kept, so `split("a,,b", ",", false)`
/// yields three entries.
pub fn str_split<'a>(s: &'a str, delim: &str, trim: bool) -> Vec<&'a str> {
    if delim.is_empty() {
        let piece = if trim { str_trim(s) } else { s };
        return vec![piece];
    }
    s.split(delim)
        .map(|piece| if trim { str_trim(piece) } else { piece })
        .collect()
}

/// Join `parts` with `sep`, sizing the result up front.
pub fn str_join(parts: &[&str], sep: &str) -> String {
    if parts.is_empty() {
        return String::new();
    }
    let total: usize =
        parts.iter().map(|p| p.len()).sum::<usize>() + sep.len() * (parts.len() - 1);
    let mut out = String::with_capacity(total);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(part);
    }
    out
}

/// Strip ASCII whitespace from both ends.
pub fn str_trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}
