//! Binary struct packing with a compact format string, in the style of
//! Lua's `string.pack`.
//!
//! Format codes, one value each unless noted:
//!
//! | code | meaning |
//! |------|---------|
//! | `b`/`B` | signed / unsigned 8-bit |
//! | `h`/`H` | signed / unsigned 16-bit |
//! | `i<n>`/`I<n>` | signed / unsigned integer of `n` bytes (1–8), 4 if omitted |
//! | `l`/`L` | signed / unsigned 64-bit |
//! | `T` | platform size type, 64-bit unsigned |
//! | `f`/`d` | 32-bit / 64-bit float |
//! | `s<n>` | bytes, `n`-byte length prefix (1–8), 8 if omitted |
//! | `z` | bytes, NUL terminated |
//! | `c<n>` | exactly `n` raw bytes |
//! | `x` | one zero pad byte, no value |
//! | `X<op>` | zero padding up to `op`'s alignment, no value |
//! | `<` `>` `=` | little / big / native byte order from here on |
//! | `!<n>` | cap `X` alignment at `n` (a power of two); bare `!` restores 8 |
//!
//! Lowercase integer codes are signed, uppercase unsigned; a value that
//! does not fit the code's width is an error, not a silent truncation.

use std::fmt;

/// A value passed to [`pack`] or produced by [`unpack`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Format character with no meaning, reported by position in the format
    /// string.
    UnknownCode { code: char, position: usize },
    /// The value supplied for a code has the wrong variant.
    TypeMismatch { code: char, expected: &'static str },
    /// Fewer values than the format consumes.
    MissingValue { code: char },
    /// An integer that does not fit the code's width.
    OutOfRange { code: char },
    /// `c` without digits, or a count too large to hold.
    BadCount { position: usize },
    /// `X` at the end of the format, or before a code with no alignment.
    BadAlignment { position: usize },
    /// Input ended before the field did.
    Truncated { needed: usize, available: usize },
    /// A `z` value may not contain NUL.
    NulInString,
    /// A `c<n>` value whose length is not `n`.
    SizeMismatch { code: char, expected: usize, actual: usize },
    /// A `z` field with no terminator in the input.
    UnterminatedString,
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::UnknownCode { code, position } => {
                write!(f, "unknown format code '{}' at position {}", code, position)
            }
            PackError::TypeMismatch { code, expected } => {
                write!(f, "format code '{}' needs a {} value", code, expected)
            }
            PackError::MissingValue { code } => {
                write!(f, "no value left for format code '{}'", code)
            }
            PackError::OutOfRange { code } => {
                write!(f, "value out of range for format code '{}'", code)
            }
            PackError::BadCount { position } => {
                write!(f, "bad count at position {}", position)
            }
            PackError::BadAlignment { position } => {
                write!(f, "'X' needs a sized code after it at position {}", position)
            }
            PackError::Truncated { needed, available } => {
                write!(f, "input too short. needed = {}, available = {}", needed, available)
            }
            PackError::NulInString => write!(f, "'z' value contains a NUL byte"),
            PackError::SizeMismatch { code, expected, actual } => {
                write!(
                    f,
                    "format code '{}' expects {} bytes, value has {}",
                    code, expected, actual
                )
            }
            PackError::UnterminatedString => write!(f, "unterminated 'z' string"),
        }
    }
}

impl std::error::Error for PackError {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

const NATIVE: Endian = if cfg!(target_endian = "big") {
    Endian::Big
} else {
    Endian::Little
};

/// `X` alignment cap when no `!<n>` directive has run.
const DEFAULT_MAX_ALIGN: usize = 8;

/// Natural size of a fixed-width code, `None` for everything else.
fn code_size(code: char) -> Option<usize> {
    match code {
        'b' | 'B' | 'x' => Some(1),
        'h' | 'H' => Some(2),
        'f' => Some(4),
        'l' | 'L' | 'T' | 'd' => Some(8),
        _ => None,
    }
}

/// Pack `values` per `format` into a fresh buffer.
pub fn pack(format: &str, values: &[Value]) -> Result<Vec<u8>, PackError> {
    let mut out = Vec::new();
    let mut endian = NATIVE;
    let mut max_align = DEFAULT_MAX_ALIGN;
    let mut values = values.iter();
    let mut chars = format.char_indices().peekable();

    while let Some((position, code)) = chars.next() {
        match code {
            '<' => endian = Endian::Little,
            '>' => endian = Endian::Big,
            '=' => endian = NATIVE,
            '!' => max_align = take_align(&mut chars, position)?,
            'x' => out.push(0),
            'X' => {
                // The code after X is an alignment reference only; it packs
                // nothing itself.
                let align = reference_align(&mut chars, position)?.min(max_align);
                while out.len() % align != 0 {
                    out.push(0);
                }
            }
            'b' | 'h' | 'l' => {
                let size = code_size(code).unwrap_or(8);
                put_int(&mut out, take_int(&mut values, code)?, size, endian, code)?;
            }
            'i' => {
                let size = int_size(&mut chars, position, 4)?;
                put_int(&mut out, take_int(&mut values, code)?, size, endian, code)?;
            }
            'B' | 'H' | 'L' | 'T' => {
                let size = code_size(code).unwrap_or(8);
                put_uint_checked(&mut out, take_uint(&mut values, code)?, size, endian, code)?;
            }
            'I' => {
                let size = int_size(&mut chars, position, 4)?;
                put_uint_checked(&mut out, take_uint(&mut values, code)?, size, endian, code)?;
            }
            'f' => {
                let v = take_float(&mut values, code)? as f32;
                put_uint(&mut out, u64::from(v.to_bits()), 4, endian);
            }
            'd' => {
                let v = take_float(&mut values, code)?;
                put_uint(&mut out, v.to_bits(), 8, endian);
            }
            's' => {
                let prefix = int_size(&mut chars, position, 8)?;
                let bytes = take_bytes(&mut values, code)?;
                if prefix < 8 && (bytes.len() as u64) >> (prefix * 8) != 0 {
                    return Err(PackError::OutOfRange { code });
                }
                put_uint(&mut out, bytes.len() as u64, prefix, endian);
                out.extend_from_slice(bytes);
            }
            'z' => {
                let bytes = take_bytes(&mut values, code)?;
                if bytes.contains(&0) {
                    return Err(PackError::NulInString);
                }
                out.extend_from_slice(bytes);
                out.push(0);
            }
            'c' => {
                let count = take_count(&mut chars, position)?;
                let bytes = take_bytes(&mut values, code)?;
                if bytes.len() != count {
                    return Err(PackError::SizeMismatch {
                        code,
                        expected: count,
                        actual: bytes.len(),
                    });
                }
                out.extend_from_slice(bytes);
            }
            c if c.is_ascii_whitespace() => {}
            _ => return Err(PackError::UnknownCode { code, position }),
        }
    }
    Ok(out)
}

/// Unpack `data` per `format`.
pub fn unpack(format: &str, data: &[u8]) -> Result<Vec<Value>, PackError> {
    let mut out = Vec::new();
    let mut endian = NATIVE;
    let mut max_align = DEFAULT_MAX_ALIGN;
    let mut pos = 0usize;
    let mut chars = format.char_indices().peekable();

    while let Some((position, code)) = chars.next() {
        match code {
            '<' => endian = Endian::Little,
            '>' => endian = Endian::Big,
            '=' => endian = NATIVE,
            '!' => max_align = take_align(&mut chars, position)?,
            'x' => pos = advance(pos, 1, data.len())?,
            'X' => {
                let align = reference_align(&mut chars, position)?.min(max_align);
                while pos % align != 0 {
                    pos = advance(pos, 1, data.len())?;
                }
            }
            'b' | 'h' | 'l' => {
                let size = code_size(code).unwrap_or(8);
                let raw = get_uint(data, &mut pos, size, endian)?;
                out.push(Value::Int(sign_extend(raw, size)));
            }
            'i' => {
                let size = int_size(&mut chars, position, 4)?;
                let raw = get_uint(data, &mut pos, size, endian)?;
                out.push(Value::Int(sign_extend(raw, size)));
            }
            'B' | 'H' | 'L' | 'T' => {
                let size = code_size(code).unwrap_or(8);
                let raw = get_uint(data, &mut pos, size, endian)?;
                out.push(Value::Uint(raw));
            }
            'I' => {
                let size = int_size(&mut chars, position, 4)?;
                let raw = get_uint(data, &mut pos, size, endian)?;
                out.push(Value::Uint(raw));
            }
            'f' => {
                let raw = get_uint(data, &mut pos, 4, endian)?;
                out.push(Value::Float(f64::from(f32::from_bits(raw as u32))));
            }
            'd' => {
                let raw = get_uint(data, &mut pos, 8, endian)?;
                out.push(Value::Float(f64::from_bits(raw)));
            }
            's' => {
                let prefix = int_size(&mut chars, position, 8)?;
                let len = get_uint(data, &mut pos, prefix, endian)? as usize;
                let end = advance(pos, len, data.len())?;
                out.push(Value::Bytes(data[pos..end].to_vec()));
                pos = end;
            }
            'z' => {
                let rel = data[pos..]
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(PackError::UnterminatedString)?;
                out.push(Value::Bytes(data[pos..pos + rel].to_vec()));
                pos += rel + 1;
            }
            'c' => {
                let count = take_count(&mut chars, position)?;
                let end = advance(pos, count, data.len())?;
                out.push(Value::Bytes(data[pos..end].to_vec()));
                pos = end;
            }
            c if c.is_ascii_whitespace() => {}
            _ => return Err(PackError::UnknownCode { code, position }),
        }
    }
    Ok(out)
}

fn advance(pos: usize, by: usize, len: usize) -> Result<usize, PackError> {
    let end = pos.checked_add(by).filter(|&e| e <= len);
    end.ok_or(PackError::Truncated {
        needed: by,
        available: len - pos,
    })
}

fn sign_extend(raw: u64, size: usize) -> i64 {
    let shift = 64 - size * 8;
    ((raw << shift) as i64) >> shift
}

fn put_uint(out: &mut Vec<u8>, v: u64, size: usize, endian: Endian) {
    let le = v.to_le_bytes();
    match endian {
        Endian::Little => out.extend_from_slice(&le[..size]),
        Endian::Big => out.extend(le[..size].iter().rev()),
    }
}

fn get_uint(data: &[u8], pos: &mut usize, size: usize, endian: Endian) -> Result<u64, PackError> {
    let end = advance(*pos, size, data.len())?;
    let field = &data[*pos..end];
    *pos = end;
    let mut v = 0u64;
    match endian {
        Endian::Little => {
            for &b in field.iter().rev() {
                v = (v << 8) | u64::from(b);
            }
        }
        Endian::Big => {
            for &b in field {
                v = (v << 8) | u64::from(b);
            }
        }
    }
    Ok(v)
}

type FormatChars<'f> = std::iter::Peekable<std::str::CharIndices<'f>>;

/// Digit run following a code, if any.
fn opt_count(chars: &mut FormatChars<'_>, position: usize) -> Result<Option<usize>, PackError> {
    let mut count: Option<usize> = None;
    while let Some(&(_, c)) = chars.peek() {
        let Some(digit) = c.to_digit(10) else { break };
        chars.next();
        let next = count
            .unwrap_or(0)
            .checked_mul(10)
            .and_then(|n| n.checked_add(digit as usize))
            .ok_or(PackError::BadCount { position })?;
        count = Some(next);
    }
    Ok(count)
}

fn take_count(chars: &mut FormatChars<'_>, position: usize) -> Result<usize, PackError> {
    opt_count(chars, position)?.ok_or(PackError::BadCount { position })
}

/// Byte width of a sized integer code (`i<n>`, `I<n>`, `s<n>` prefix),
/// falling back to the code's default width.
fn int_size(
    chars: &mut FormatChars<'_>,
    position: usize,
    default: usize,
) -> Result<usize, PackError> {
    match opt_count(chars, position)? {
        None => Ok(default),
        Some(n) if (1..=8).contains(&n) => Ok(n),
        Some(_) => Err(PackError::BadCount { position }),
    }
}

/// Alignment cap for a `!<n>` directive; bare `!` restores the default.
fn take_align(chars: &mut FormatChars<'_>, position: usize) -> Result<usize, PackError> {
    match opt_count(chars, position)? {
        None => Ok(DEFAULT_MAX_ALIGN),
        Some(n) if n.is_power_of_two() && n <= 16 => Ok(n),
        Some(_) => Err(PackError::BadCount { position }),
    }
}

/// Natural alignment of the code following `X`, consuming it (and its count,
/// for the sized integer codes).
fn reference_align(chars: &mut FormatChars<'_>, position: usize) -> Result<usize, PackError> {
    let Some((next_position, next)) = chars.next() else {
        return Err(PackError::BadAlignment { position });
    };
    match next {
        'i' | 'I' => int_size(chars, next_position, 4),
        _ => code_size(next).ok_or(PackError::BadAlignment { position }),
    }
}

fn put_int(
    out: &mut Vec<u8>,
    v: i64,
    size: usize,
    endian: Endian,
    code: char,
) -> Result<(), PackError> {
    if size < 8 && sign_extend(v as u64, size) != v {
        return Err(PackError::OutOfRange { code });
    }
    put_uint(out, v as u64, size, endian);
    Ok(())
}

fn put_uint_checked(
    out: &mut Vec<u8>,
    v: u64,
    size: usize,
    endian: Endian,
    code: char,
) -> Result<(), PackError> {
    if size < 8 && v >> (size * 8) != 0 {
        return Err(PackError::OutOfRange { code });
    }
    put_uint(out, v, size, endian);
    Ok(())
}

fn take_int<'a>(
    values: &mut impl Iterator<Item = &'a Value>,
    code: char,
) -> Result<i64, PackError> {
    match values.next() {
        Some(Value::Int(v)) => Ok(*v),
        Some(_) => Err(PackError::TypeMismatch { code, expected: "signed integer" }),
        None => Err(PackError::MissingValue { code }),
    }
}

fn take_uint<'a>(
    values: &mut impl Iterator<Item = &'a Value>,
    code: char,
) -> Result<u64, PackError> {
    match values.next() {
        Some(Value::Uint(v)) => Ok(*v),
        Some(_) => Err(PackError::TypeMismatch { code, expected: "unsigned integer" }),
        None => Err(PackError::MissingValue { code }),
    }
}

fn take_float<'a>(
    values: &mut impl Iterator<Item = &'a Value>,
    code: char,
) -> Result<f64, PackError> {
    match values.next() {
        Some(Value::Float(v)) => Ok(*v),
        Some(_) => Err(PackError::TypeMismatch { code, expected: "float" }),
        None => Err(PackError::MissingValue { code }),
    }
}

fn take_bytes<'a>(
    values: &mut impl Iterator<Item = &'a Value>,
    code: char,
) -> Result<&'a [u8], PackError> {
    match values.next() {
        Some(Value::Bytes(v)) => Ok(v),
        Some(_) => Err(PackError::TypeMismatch { code, expected: "byte string" }),
        None => Err(PackError::MissingValue { code }),
    }
}
