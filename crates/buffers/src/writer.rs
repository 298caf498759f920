//! Binary buffer writer with auto-growing capacity.

/// A little-endian binary writer, the encoding mirror of [`crate::Cursor`].
///
/// # Example
///
/// ```
/// use patchwire_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x03, 0x02]);
/// ```
#[derive(Debug, Clone)]
pub struct Writer {
    uint8: Vec<u8>,
    /// Position where last flush happened.
    x0: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with a small default allocation.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new writer that can hold `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
            x0: 0,
        }
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.uint8.len() - self.x0
    }

    /// Returns `true` if nothing was written since the last flush.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the written data and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..].to_vec();
        self.uint8.clear();
        self.x0 = 0;
        result
    }

    /// Consumes the writer and returns everything written since the last flush.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.x0 > 0 {
            self.uint8.drain(..self.x0);
        }
        self.uint8
    }

    // ── Fixed-width scalars ──────────────────────────────────────────────

    /// Writes a boolean as a single `0` or `1` byte.
    #[inline]
    pub fn bool(&mut self, val: bool) {
        self.uint8.push(u8::from(val));
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes a signed 8-bit integer.
    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 16-bit integer.
    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 16-bit integer.
    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer.
    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 32-bit integer.
    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer.
    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a signed 64-bit integer.
    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 32-bit floating point number.
    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 64-bit floating point number.
    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a `usize` as a `u64` length or count prefix.
    #[inline]
    pub fn len_prefix(&mut self, len: usize) {
        self.u64(len as u64);
    }

    // ── Raw bytes and text ───────────────────────────────────────────────

    /// Writes a byte slice with no prefix.
    pub fn buf(&mut self, buf: &[u8]) {
        self.uint8.extend_from_slice(buf);
    }

    /// Writes a `u64`-length-prefixed UTF-8 string.
    pub fn str(&mut self, s: &str) {
        self.len_prefix(s.len());
        self.uint8.extend_from_slice(s.as_bytes());
    }

    /// Writes a single Unicode scalar as UTF-8. Returns the encoded width.
    pub fn char(&mut self, c: char) -> usize {
        let mut tmp = [0u8; 4];
        let encoded = c.encode_utf8(&mut tmp);
        self.uint8.extend_from_slice(encoded.as_bytes());
        encoded.len()
    }

    /// Writes a boolean presence tag, then the value through `write` if present.
    pub fn optional<T>(&mut self, value: Option<T>, write: impl FnOnce(&mut Self, T)) {
        match value {
            Some(value) => {
                self.bool(true);
                write(self, value);
            }
            None => self.bool(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x01, 0x02]);
    }

    #[test]
    fn test_u16() {
        let mut writer = Writer::new();
        writer.u16(0x0102);
        assert_eq!(writer.flush(), [0x02, 0x01]);
    }

    #[test]
    fn test_u32() {
        let mut writer = Writer::new();
        writer.u32(0x01020304);
        assert_eq!(writer.flush(), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_str_prefix() {
        let mut writer = Writer::new();
        writer.str("hi");
        assert_eq!(writer.flush(), [2, 0, 0, 0, 0, 0, 0, 0, b'h', b'i']);
    }

    #[test]
    fn test_flush_multiple() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        assert_eq!(writer.flush(), [0x01]);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x02]);
        assert!(writer.is_empty());
    }

    #[test]
    fn test_i8_negative() {
        let mut writer = Writer::new();
        writer.i8(-2i8);
        assert_eq!(writer.flush(), [0xfe]);
    }

    #[test]
    fn test_char_width() {
        let mut writer = Writer::new();
        assert_eq!(writer.char('a'), 1);
        assert_eq!(writer.char('\u{e9}'), 2);
        assert_eq!(writer.char('\u{20ac}'), 3);
        assert_eq!(writer.char('\u{1f600}'), 4);
        assert_eq!(writer.len(), 10);
    }

    #[test]
    fn test_optional() {
        let mut writer = Writer::new();
        writer.optional(Some(7u8), Writer::u8);
        writer.optional(None::<u8>, Writer::u8);
        assert_eq!(writer.into_vec(), [1, 7, 0]);
    }
}
