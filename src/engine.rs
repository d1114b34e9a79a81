//! Generic bulk-transform driver.
//!
//! Every codec direction is a [`LaneKernel`]: a fixed input:output byte ratio
//! plus a transform over one step's worth of bytes. `drive` walks a buffer
//! with a kernel, taking full steps while the kernel's windowed load stays
//! inside the source, then finishing the remainder through fill-padded stack
//! buffers so neither loads nor stores ever touch memory outside the caller's
//! buffers.
//!
//! The scalar kernels in `base64`/`hex`/`str` implement the same trait with
//! `IN_STEP` of a single symbol group; they are both the universal fallback
//! and the reference the vector kernels are validated against.

use crate::error::InputError;

/// Upper bound on `IN_STEP + OVERREAD` and `OUT_STEP` across all kernels;
/// sizes the stack buffers used for the masked tail step.
pub(crate) const TAIL_BUF: usize = 128;

/// A per-step transform with a fixed byte ratio.
pub(crate) trait LaneKernel {
    /// Input bytes consumed per full step.
    const IN_STEP: usize;
    /// Output bytes produced per full step.
    const OUT_STEP: usize;
    /// Extra source bytes a step may read past `IN_STEP` (windowed loads).
    const OVERREAD: usize;
    /// Byte the tail buffer is padded with; must transform without error.
    const TAIL_FILL: u8;

    /// Transform `src[idx .. idx + IN_STEP]` into `dst[out .. out + OUT_STEP]`.
    ///
    /// The driver guarantees `idx + IN_STEP + OVERREAD <= src.len()` and
    /// `out + OUT_STEP <= dst.len()`. On an invalid input byte, returns its
    /// step-relative position; the driver translates that to an absolute
    /// offset exactly once.
    fn step(&self, src: &[u8], idx: usize, dst: &mut [u8], out: usize) -> Result<(), usize>;
}

/// Apply `kernel` across `src`, filling `dst` exactly.
///
/// `dst` must be pre-sized to the exact output length for `src.len()`; the
/// final partial step stores only `dst.len() - produced` bytes, never a full
/// lane's worth.
pub(crate) fn drive<K: LaneKernel>(
    kernel: &K,
    src: &[u8],
    dst: &mut [u8],
) -> Result<(), InputError> {
    debug_assert!(K::IN_STEP + K::OVERREAD <= TAIL_BUF);
    debug_assert!(K::OUT_STEP <= TAIL_BUF);

    let len = src.len();
    let mut idx = 0;
    let mut out = 0;

    // Full steps stop early enough that the windowed load stays in bounds.
    let safe = len.saturating_sub(K::OVERREAD);
    while idx + K::IN_STEP <= safe {
        if let Err(rel) = kernel.step(src, idx, dst, out) {
            return Err(InputError::new(idx + rel, src[idx + rel]));
        }
        idx += K::IN_STEP;
        out += K::OUT_STEP;
    }

    // Remainder: bounce through stack buffers padded with a byte the kernel
    // accepts, then copy out only the bytes the true input length implies.
    while idx < len {
        let rem = len - idx;
        let take_in = rem.min(K::IN_STEP);

        let mut ibuf = [K::TAIL_FILL; TAIL_BUF];
        let mut obuf = [0u8; TAIL_BUF];
        ibuf[..take_in].copy_from_slice(&src[idx..idx + take_in]);

        if let Err(rel) = kernel.step(&ibuf, 0, &mut obuf, 0) {
            return Err(InputError::new(idx + rel, src[idx + rel]));
        }

        let take_out = (dst.len() - out).min(K::OUT_STEP);
        dst[out..out + take_out].copy_from_slice(&obuf[..take_out]);
        idx += take_in;
        out += take_out;
    }

    Ok(())
}

/// `drive` for kernels that accept every byte value (encoders, case maps).
pub(crate) fn drive_infallible<K: LaneKernel>(kernel: &K, src: &[u8], dst: &mut [u8]) {
    if drive(kernel, src, dst).is_err() {
        unreachable!("infallible kernel reported invalid input");
    }
}
