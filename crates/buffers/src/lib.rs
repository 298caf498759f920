//! patchwire-buffers - binary cursor and writer for the patchwire wire format.
//!
//! All multi-byte values are little-endian. Lengths are `u64` prefixes and
//! strings are strictly validated UTF-8.

pub mod cursor;
pub mod writer;

pub use cursor::{Cursor, DEFAULT_MAX_DEPTH};
pub use writer::Writer;

use thiserror::Error;

/// Errors produced while reading from a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Not enough bytes remain for the requested read.
    #[error("unexpected end of buffer: needed {needed} byte(s), {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },
    /// A boolean byte other than `0` or `1`.
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),
    /// A length-prefixed string that is not valid UTF-8.
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    /// A byte that cannot appear at this position of a UTF-8 sequence.
    #[error("UTF-8 decoding error, unexpected byte 0x{0:02x}")]
    UnexpectedByte(u8),
    /// A well-formed sequence that is overlong, a surrogate or out of range.
    #[error("UTF-8 decoding error, invalid scalar encoding 0x{0:x}")]
    InvalidScalar(u32),
    /// Bytes left over after a top-level decode.
    #[error("{0} trailing byte(s) after message")]
    TrailingBytes(usize),
    /// A `u64` length that does not fit the address space.
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
    /// More nested values than the cursor allows.
    #[error("nesting deeper than {max} levels")]
    TooDeep { max: usize },
}

impl BufferError {
    /// Returns `true` for malformed text, `false` for framing problems.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            BufferError::InvalidUtf8 | BufferError::UnexpectedByte(_) | BufferError::InvalidScalar(_)
        )
    }
}
