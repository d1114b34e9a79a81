//! NEON ASCII case-flip kernel: 16 bytes per step, 1:1.

use std::arch::aarch64::*;

use crate::engine::LaneKernel;

/// Flips bit 5 of every byte inside `LO..=HI`, leaves the rest alone.
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
        // SAFETY: dispatched only after neon is detected.
        unsafe { flip_step(src.as_ptr().add(idx), dst.as_mut_ptr().add(out), LO, HI) };
        Ok(())
    }
}

#[target_feature(enable = "neon")]
unsafe fn flip_step(src: *const u8, dst: *mut u8, lo: u8, hi: u8) {
    unsafe {
        let v = vld1q_u8(src);
        let in_range = vandq_u8(vcgeq_u8(v, vdupq_n_u8(lo)), vcleq_u8(v, vdupq_n_u8(hi)));
        let flipped = veorq_u8(v, vandq_u8(in_range, vdupq_n_u8(0x20)));
        vst1q_u8(dst, flipped);
    }
}
