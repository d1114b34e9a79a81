//! End-to-end codec tests, cross-checked against the `base64` and `hex`
//! crates as independent oracles.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lanebase::{DecodeError, decode_base64, decode_hex, encode_base64, encode_hex};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(131).wrapping_add(17)) as u8).collect()
}

#[test]
fn base64_rfc4648_vectors() {
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
        assert_eq!(encode_base64(input), expected);
        assert_eq!(decode_base64(expected).unwrap(), input);
    }
}

#[test]
fn base64_agrees_with_oracle() {
    for len in 0..=300 {
        let data = pattern(len);
        let ours = encode_base64(&data);
        assert_eq!(ours, STANDARD.encode(&data), "encode len {}", len);
        assert_eq!(decode_base64(&ours).unwrap(), data, "decode len {}", len);
    }
}

#[test]
fn hex_agrees_with_oracle() {
    for len in 0..=300 {
        let data = pattern(len);
        let ours = encode_hex(&data);
        assert_eq!(ours, hex::encode(&data), "encode len {}", len);
        assert_eq!(decode_hex(&ours).unwrap(), data, "decode len {}", len);
    }
}

#[test]
fn hex_accepts_uppercase_input() {
    for len in 0..=64 {
        let data = pattern(len);
        let upper = hex::encode_upper(&data);
        assert_eq!(decode_hex(&upper).unwrap(), data, "len {}", len);
    }
}

// Inputs straddling the dispatch cutoffs and the vector step sizes; the
// scalar and vector paths must meet exactly at these seams.
#[test]
fn boundary_lengths() {
    for base in [8usize, 16, 32, 64] {
        for len in [base - 1, base, base + 1] {
            let data = pattern(len);
            assert_eq!(decode_base64(&encode_base64(&data)).unwrap(), data);
            assert_eq!(decode_hex(&encode_hex(&data)).unwrap(), data);
        }
    }
}

#[test]
fn base64_error_reporting() {
    let err = decode_base64("Z g=").unwrap_err();
    assert_eq!(err.to_string(), "Input error. offset = 1, byte = 32( )");

    // '=' outside the trailing padding positions is a content error at its
    // own offset.
    let err = decode_base64("Zg=a").unwrap_err();
    assert!(matches!(err, DecodeError::Input(e) if e.offset == 2 && e.byte == b'='));
    assert!(matches!(decode_base64("===="), Err(DecodeError::Input(_))));

    assert!(matches!(
        decode_base64("Zg="),
        Err(DecodeError::Length { actual: 3, .. })
    ));
}

#[test]
fn base64_error_offset_deep_in_input() {
    let mut s = encode_base64(&pattern(90)); // 120 symbols
    s.replace_range(97..98, "*");
    let err = decode_base64(&s).unwrap_err();
    assert!(matches!(err, DecodeError::Input(e) if e.offset == 97 && e.byte == b'*'));
}

#[test]
fn hex_error_reporting() {
    let err = decode_hex("zz").unwrap_err();
    assert_eq!(err.to_string(), "Input error. offset = 0, byte = 122(z)");

    assert!(matches!(
        decode_hex("abcde"),
        Err(DecodeError::Length { actual: 5, .. })
    ));

    let mut s = "ab".repeat(50);
    s.replace_range(83..84, "x");
    let err = decode_hex(&s).unwrap_err();
    assert!(matches!(err, DecodeError::Input(e) if e.offset == 83 && e.byte == b'x'));
}

#[test]
fn all_byte_values_survive() {
    let data: Vec<u8> = (0u8..=255).collect();
    assert_eq!(decode_base64(&encode_base64(&data)).unwrap(), data);
    assert_eq!(decode_hex(&encode_hex(&data)).unwrap(), data);
}
