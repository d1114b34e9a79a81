//! Runtime backend selection for the vector kernels.
//!
//! Detection runs once per process and is cached; every codec call after
//! that is a load and a match. The scalar backend is always available and
//! doubles as the reference the vector kernels are tested against.

use std::sync::OnceLock;

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
pub(crate) mod aarch64;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod x86_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    #[cfg(target_arch = "x86_64")]
    Avx2,
    #[cfg(target_arch = "x86_64")]
    Ssse3,
    #[cfg(target_arch = "aarch64")]
    Neon,
    Scalar,
}

static BACKEND: OnceLock<Backend> = OnceLock::new();

pub(crate) fn backend() -> Backend {
    *BACKEND.get_or_init(detect)
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn detect() -> Backend {
    if is_x86_feature_detected!("avx2") {
        Backend::Avx2
    } else if is_x86_feature_detected!("ssse3") {
        Backend::Ssse3
    } else {
        Backend::Scalar
    }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
fn detect() -> Backend {
    if std::arch::is_aarch64_feature_detected!("neon") {
        Backend::Neon
    } else {
        Backend::Scalar
    }
}

#[cfg(not(all(feature = "simd", any(target_arch = "x86_64", target_arch = "aarch64"))))]
fn detect() -> Backend {
    Backend::Scalar
}

/// Width in bytes of the vector registers the selected backend uses, or 1
/// when the codecs run scalar.
pub fn lane_width() -> usize {
    match backend() {
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 => 32,
        #[cfg(target_arch = "x86_64")]
        Backend::Ssse3 => 16,
        #[cfg(target_arch = "aarch64")]
        Backend::Neon => 16,
        Backend::Scalar => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_is_stable() {
        assert_eq!(backend(), backend());
    }

    #[test]
    fn test_lane_width_matches_backend() {
        let width = lane_width();
        match backend() {
            Backend::Scalar => assert_eq!(width, 1),
            _ => assert!(width == 16 || width == 32),
        }
    }
}
