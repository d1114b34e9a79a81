use std::fmt;

/// Content error: the first input byte that fails validation.
///
/// `offset` is the absolute byte position in the original input, computed
/// once at the engine boundary from the failing chunk's base offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputError {
    pub offset: usize,
    pub byte: u8,
}

impl InputError {
    pub(crate) fn new(offset: usize, byte: u8) -> Self {
        Self { offset, byte }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Input error. offset = {}, byte = {}({})",
            self.offset, self.byte, self.byte as char
        )
    }
}

impl std::error::Error for InputError {}

/// Errors that can occur during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The input contains a byte outside the codec's alphabet.
    Input(InputError),
    /// The input length is structurally impossible for the format
    /// (odd-length hex, base64 not a multiple of 4).
    Length {
        actual: usize,
        expected: &'static str,
    },
}

impl From<InputError> for DecodeError {
    fn from(e: InputError) -> Self {
        DecodeError::Input(e)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Input(e) => write!(f, "{}", e),
            DecodeError::Length { actual, expected } => {
                write!(f, "Length error. len = {}, expected {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_message() {
        let err = InputError::new(1, b' ');
        assert_eq!(format!("{}", err), "Input error. offset = 1, byte = 32( )");

        let err = InputError::new(12, b'_');
        assert_eq!(
            format!("{}", err),
            "Input error. offset = 12, byte = 95(_)"
        );
    }

    #[test]
    fn test_length_error_message() {
        let err = DecodeError::Length {
            actual: 5,
            expected: "an even length",
        };
        assert_eq!(format!("{}", err), "Length error. len = 5, expected an even length");
    }
}
