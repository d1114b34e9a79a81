//! Vectorized binary-to-text codecs.
//!
//! Converts byte buffers to and from base64 (RFC 4648, standard alphabet)
//! and lowercase hexadecimal, processing a full hardware vector register per
//! step instead of one byte at a time. Runtime CPU feature detection selects
//! AVX2 or SSSE3 on x86_64 and NEON on aarch64; a width-1 scalar backend
//! covers every other machine and doubles as the correctness oracle for the
//! vector paths.
//!
//! All operations consume a complete in-memory buffer and produce a complete
//! in-memory result. There is no shared mutable state: lookup tables are
//! constants and the backend choice is made once per process, so concurrent
//! calls from independent threads need no synchronization.

mod base64;
mod engine;
mod error;
mod hex;
pub mod pack;
pub mod rng;
mod simd;
mod str;

pub use self::base64::{decode_base64, encode_base64};
pub use self::error::{DecodeError, InputError};
pub use self::hex::{decode_hex, encode_hex};
pub use self::simd::lane_width;
pub use self::str::{str_join, str_split, str_to_lower, str_to_upper, str_trim};
