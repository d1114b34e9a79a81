//! Convenience random helpers backed by a thread-local generator.
//!
//! The generator is seeded from the operating system once per thread; these
//! are utility numbers, not key material.

use std::cell::RefCell;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

/// Uniform float in `[0, 1)`.
pub fn random() -> f64 {
    RNG.with(|rng| rng.borrow_mut().random::<f64>())
}

/// Uniform integer in `[0, bound)`. Returns 0 for a zero bound.
pub fn random_below(bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    RNG.with(|rng| rng.borrow_mut().random_range(0..bound))
}

/// Uniform integer in `[lo, hi]`, bounds swapped if given backwards.
pub fn random_between(lo: i64, hi: i64) -> i64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    RNG.with(|rng| rng.borrow_mut().random_range(lo..=hi))
}
