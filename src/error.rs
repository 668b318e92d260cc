use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure this library can return.
///
/// # Error Categories
///
/// ## Decoding Errors
/// - [`Error::TruncatedStream`] - An opcode or operand runs past the end of the buffer
/// - [`Error::UnknownOpcode`] - The byte sequence does not name a defined opcode
/// - [`Error::UnsupportedTokenKind`] - A token names a table the operand does not accept
/// - [`Error::Decode`] - Wrapper adding the instruction address to any of the above
///
/// ## Resolution Errors
/// - [`Error::TokenNotFound`] - The symbol table has no row for a token
/// - [`Error::NoMetadata`] - Resolution was required but no symbol table is available
///
/// ## Input Errors
/// - [`Error::NoBody`] - The method has no instruction stream
/// - [`Error::Malformed`] - Corrupted heap or method header
/// - [`Error::OutOfBounds`] - A bounds-checked read failed
/// - [`Error::FileError`] - Filesystem I/O error
///
/// # Examples
///
/// ```rust
/// use ilscope::{decode_all, Error};
///
/// // `ldc.i4` needs four operand bytes
/// let result: Result<Vec<_>, _> = decode_all(&[0x20, 0x01], None).collect();
/// match result {
///     Err(err @ Error::Decode { .. }) => {
///         assert_eq!(err.offset(), Some(0));
///         assert!(matches!(err.cause(), Error::TruncatedStream));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The instruction stream ended in the middle of an opcode or operand.
    #[error("Instruction stream is truncated")]
    TruncatedStream,

    /// The opcode is not part of the instruction set.
    ///
    /// Two-byte opcodes are reported in their combined form, `0xFE00 | second`.
    #[error("Unknown opcode 0x{0:04X}")]
    UnknownOpcode(u16),

    /// A token's table is not valid for the operand it appears in.
    ///
    /// The associated value is the table byte (the token's high byte).
    #[error("Unsupported token kind 0x{0:02X}")]
    UnsupportedTokenKind(u8),

    /// The method has no instruction stream.
    #[error("Method has no body")]
    NoBody,

    /// A symbol table was required but none is available.
    #[error("No metadata available to resolve symbols")]
    NoMetadata,

    /// The symbol table has no entry for this token.
    #[error("Token not found - {0}")]
    TokenNotFound(Token),

    /// Decoding failed at a specific instruction.
    ///
    /// # Fields
    ///
    /// * `offset` - Address of the instruction that could not be decoded
    /// * `source` - The underlying failure
    #[error("Failed to decode instruction at IL_{offset:04X}: {source}")]
    Decode {
        /// Address of the instruction being decoded
        offset: u32,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    /// The input is damaged and could not be parsed.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The batch was cancelled before this method was decoded.
    #[error("Operation was cancelled")]
    Cancelled,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl Error {
    /// Attach the address of the instruction being decoded.
    ///
    /// Errors that already carry an address are returned unchanged.
    #[must_use]
    pub fn at(self, offset: u32) -> Self {
        match self {
            Error::Decode { .. } => self,
            other => Error::Decode {
                offset,
                source: Box::new(other),
            },
        }
    }

    /// The address of the failing instruction, if known.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        match self {
            Error::Decode { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// The innermost error, with any [`Error::Decode`] wrapping removed.
    #[must_use]
    pub fn cause(&self) -> &Error {
        match self {
            Error::Decode { source, .. } => source.cause(),
            other => other,
        }
    }
}
