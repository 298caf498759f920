//! Forward-only binary cursor over an immutable byte slice.

use std::str;

use crate::BufferError;

/// Nesting limit of a cursor made with [`Cursor::new`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// A forward-only reader over an immutable byte slice.
///
/// Every read consumes exactly its wire width and advances the cursor. A
/// read that would run past the end fails with [`BufferError::EndOfBuffer`]
/// and leaves the cursor where it was, so a partially decoded value is never
/// observable.
///
/// # Example
///
/// ```
/// use patchwire_buffers::Cursor;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05];
/// let mut cursor = Cursor::new(&data);
///
/// assert_eq!(cursor.u8(), Ok(0x01));
/// assert_eq!(cursor.u32(), Ok(0x0504_0302));
/// assert!(cursor.end().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    uint8: &'a [u8],
    x: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `uint8`.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self {
            uint8,
            x: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how many [`Cursor::nested`] levels may be open at once.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Returns the number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.uint8.len() - self.x
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    fn check(&self, needed: usize) -> Result<(), BufferError> {
        let remaining = self.remaining();
        if needed > remaining {
            Err(BufferError::EndOfBuffer { needed, remaining })
        } else {
            Ok(())
        }
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.uint8[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    /// Peeks at the next byte without advancing.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.check(1)?;
        Ok(self.uint8[self.x])
    }

    // ── Fixed-width scalars ──────────────────────────────────────────────

    /// Reads a boolean encoded as a single `0` or `1` byte.
    pub fn bool(&mut self) -> Result<bool, BufferError> {
        match self.peek()? {
            0 => {
                self.x += 1;
                Ok(false)
            }
            1 => {
                self.x += 1;
                Ok(true)
            }
            byte => Err(BufferError::InvalidBool(byte)),
        }
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.take::<1>()?[0])
    }

    /// Reads a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        Ok(i8::from_le_bytes(self.take()?))
    }

    /// Reads an unsigned 16-bit integer.
    #[inline]
    pub fn u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    /// Reads a signed 16-bit integer.
    #[inline]
    pub fn i16(&mut self) -> Result<i16, BufferError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    /// Reads an unsigned 32-bit integer.
    #[inline]
    pub fn u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    /// Reads a signed 32-bit integer.
    #[inline]
    pub fn i32(&mut self) -> Result<i32, BufferError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Reads an unsigned 64-bit integer.
    #[inline]
    pub fn u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    /// Reads a signed 64-bit integer.
    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_le_bytes(self.take()?))
    }

    /// Reads a 32-bit float.
    #[inline]
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Reads a 64-bit float.
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    /// Reads a `u64` length or count prefix as `usize`.
    pub fn len_prefix(&mut self) -> Result<usize, BufferError> {
        let start = self.x;
        let len = self.u64()?;
        usize::try_from(len).map_err(|_| {
            self.x = start;
            BufferError::LengthOverflow(len)
        })
    }

    // ── Raw bytes and text ───────────────────────────────────────────────

    /// Reads `size` raw bytes.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let start = self.x;
        self.x += size;
        Ok(&self.uint8[start..self.x])
    }

    /// Reads exactly `N` raw bytes into an array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.take()
    }

    /// Reads a `u64`-length-prefixed UTF-8 string without copying.
    ///
    /// The cursor does not move if the prefix, the payload or the UTF-8
    /// validation fails.
    pub fn str(&mut self) -> Result<&'a str, BufferError> {
        let start = self.x;
        let result = self
            .len_prefix()
            .and_then(|len| self.buf(len))
            .and_then(|bytes| str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8));
        if result.is_err() {
            self.x = start;
        }
        result
    }

    /// Reads a `u64`-length-prefixed UTF-8 string into an owned `String`.
    pub fn string(&mut self) -> Result<String, BufferError> {
        self.str().map(str::to_owned)
    }

    /// Reads a single Unicode scalar value encoded as UTF-8.
    ///
    /// Rejects stray continuation bytes, the never-valid lead bytes `0xC0`,
    /// `0xC1` and `0xF5..=0xFF`, malformed continuation bytes, overlong
    /// forms, surrogates and values above `U+10FFFF`.
    pub fn char(&mut self) -> Result<char, BufferError> {
        let lead = self.peek()?;
        let width = match lead {
            0x00..=0x7f => {
                self.x += 1;
                return Ok(char::from(lead));
            }
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return Err(BufferError::UnexpectedByte(lead)),
        };
        self.check(width)?;
        let bytes = &self.uint8[self.x..self.x + width];
        let mut value = u32::from(lead & (0x7f >> width));
        for &byte in &bytes[1..] {
            if byte & 0xc0 != 0x80 {
                return Err(BufferError::UnexpectedByte(byte));
            }
            value = (value << 6) | u32::from(byte & 0x3f);
        }
        let min = match width {
            2 => 0x80,
            3 => 0x800,
            _ => 0x1_0000,
        };
        if value < min || (0xd800..=0xdfff).contains(&value) || value > 0x10_ffff {
            return Err(BufferError::InvalidScalar(value));
        }
        let scalar = char::from_u32(value).ok_or(BufferError::InvalidScalar(value))?;
        self.x += width;
        Ok(scalar)
    }

    // ── Framing ──────────────────────────────────────────────────────────

    /// Reads a boolean tag and, when it is set, one more value through `read`.
    ///
    /// ```
    /// use patchwire_buffers::Cursor;
    ///
    /// let data = [1, 7, 0, 0, 0, 0];
    /// let mut cursor = Cursor::new(&data);
    /// assert_eq!(cursor.optional(|c| c.u32()), Ok(Some(7)));
    /// assert_eq!(cursor.optional(|c| c.u32()), Ok(None));
    /// ```
    pub fn optional<T, E, F>(&mut self, read: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<BufferError>,
    {
        if self.bool()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Runs `read` one nesting level deeper.
    ///
    /// Fails with [`BufferError::TooDeep`] before calling `read` once
    /// `max_depth` levels are already open, so recursive decoders stop at a
    /// bounded stack depth however the input is shaped.
    ///
    /// ```
    /// use patchwire_buffers::{BufferError, Cursor};
    ///
    /// let mut cursor = Cursor::new(&[]).with_max_depth(1);
    /// assert_eq!(cursor.nested(|c| Ok::<_, BufferError>(c.depth())), Ok(1));
    /// assert_eq!(
    ///     cursor.nested(|c| c.nested(|_| Ok::<_, BufferError>(()))),
    ///     Err(BufferError::TooDeep { max: 1 })
    /// );
    /// ```
    pub fn nested<T, E, F>(&mut self, read: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<BufferError>,
    {
        if self.depth >= self.max_depth {
            return Err(BufferError::TooDeep { max: self.max_depth }.into());
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    /// Number of [`Cursor::nested`] levels currently open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Asserts that the whole buffer has been consumed.
    pub fn end(&self) -> Result<(), BufferError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(BufferError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    #[test]
    fn test_u8() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.u8(), Ok(0x01));
        assert_eq!(cursor.u8(), Ok(0x02));
        assert_eq!(cursor.u8(), Ok(0x03));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_little_endian_widths() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(Cursor::new(&data).u16(), Ok(0x0201));
        assert_eq!(Cursor::new(&data).u32(), Ok(0x0403_0201));
        assert_eq!(Cursor::new(&data).u64(), Ok(0x0807_0605_0403_0201));
    }

    #[test]
    fn test_i8_negative() {
        let data = [0xfe];
        assert_eq!(Cursor::new(&data).i8(), Ok(-2));
    }

    #[test]
    fn test_bool() {
        let data = [0, 1, 2];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.bool(), Ok(false));
        assert_eq!(cursor.bool(), Ok(true));
        assert_eq!(cursor.bool(), Err(BufferError::InvalidBool(2)));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_u32_end_of_buffer() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = Cursor::new(&data);
        assert_eq!(
            cursor.u32(),
            Err(BufferError::EndOfBuffer { needed: 4, remaining: 3 })
        );
        // Cursor must not advance on error
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_buf() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.buf(3), Ok([1u8, 2, 3].as_ref()));
        assert_eq!(cursor.array::<2>(), Ok([4, 5]));
        assert!(cursor.buf(1).is_err());
    }

    #[test]
    fn test_str() {
        let mut writer = Writer::new();
        writer.str("héllo");
        writer.str("");
        let data = writer.flush();
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.str(), Ok("héllo"));
        assert_eq!(cursor.string(), Ok(String::new()));
        assert!(cursor.end().is_ok());
    }

    #[test]
    fn test_str_invalid_utf8_does_not_advance() {
        let mut data = 2u64.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.str(), Err(BufferError::InvalidUtf8));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_str_length_past_end() {
        let mut data = 10u64.to_le_bytes().to_vec();
        data.extend_from_slice(b"hi");
        let mut cursor = Cursor::new(&data);
        assert_eq!(
            cursor.str(),
            Err(BufferError::EndOfBuffer { needed: 10, remaining: 2 })
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_char_widths() {
        let text = "a\u{e9}\u{20ac}\u{1f600}";
        let mut cursor = Cursor::new(text.as_bytes());
        assert_eq!(cursor.char(), Ok('a'));
        assert_eq!(cursor.char(), Ok('\u{e9}'));
        assert_eq!(cursor.char(), Ok('\u{20ac}'));
        assert_eq!(cursor.char(), Ok('\u{1f600}'));
        assert!(cursor.end().is_ok());
    }

    #[test]
    fn test_char_truncated_is_framing_error() {
        let data = [0xe2, 0x82];
        let mut cursor = Cursor::new(&data);
        assert_eq!(
            cursor.char(),
            Err(BufferError::EndOfBuffer { needed: 3, remaining: 2 })
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_optional() {
        let data = [1, 0x2a, 0];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.optional(|c| c.u8()), Ok(Some(0x2a)));
        assert_eq!(cursor.optional(|c| c.u8()), Ok(None));
        assert!(cursor.end().is_ok());
    }

    #[test]
    fn test_end_trailing_bytes() {
        let data = [0u8; 3];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.end(), Err(BufferError::TrailingBytes(3)));
        cursor.buf(3).unwrap();
        assert_eq!(cursor.end(), Ok(()));
    }

    #[test]
    fn test_nested_depth_is_restored() {
        let data = [7u8];
        let mut cursor = Cursor::new(&data).with_max_depth(2);
        let inner = cursor.nested(|c| c.nested(|c| c.u8().map(|b| (b, c.depth()))));
        assert_eq!(inner, Ok((7, 2)));
        assert_eq!(cursor.depth(), 0);

        let failed: Result<(), BufferError> = cursor.nested(|c| c.nested(|c| c.nested(|_| Ok(()))));
        assert_eq!(failed, Err(BufferError::TooDeep { max: 2 }));
        assert_eq!(cursor.depth(), 0);
    }

    #[test]
    fn test_len_prefix_overflow() {
        if usize::BITS < 64 {
            let data = u64::MAX.to_le_bytes();
            let mut cursor = Cursor::new(&data);
            assert_eq!(cursor.len_prefix(), Err(BufferError::LengthOverflow(u64::MAX)));
            assert_eq!(cursor.position(), 0);
        }
    }
}
