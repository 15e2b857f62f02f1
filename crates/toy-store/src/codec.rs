//! Low-level byte writer/reader pair used to frame instructions and the
//! repository's binary format. Mirrors the reference bytecode crate's
//! `BytecodeWriter`/`BytecodeReader` split: one append-only buffer for
//! writing, one cursor over a borrowed slice for reading.

use crate::error::CodecError;

/// Appends primitive values to a growable byte buffer, little detail beyond
/// "always big-endian" — big-endian keeps the on-disk magic/class-id header
/// readable in a hex dump, which matters more here than native-endian speed.
#[derive(Debug, Default)]
pub struct Writer {
    pub(crate) buffer: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Current length of the buffer, i.e. the offset the next write will
    /// land at.
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Consumes the writer, returning the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Borrows the accumulated bytes without consuming the writer.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Appends raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Appends a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian `f64`.
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a length-prefixed UTF-8 string (`u32` byte length, then the
    /// bytes).
    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    /// Appends a length-prefixed byte blob (`u32` byte length, then the
    /// bytes).
    pub fn write_blob(&mut self, value: &[u8]) {
        self.write_u32(value.len() as u32);
        self.write_bytes(value);
    }
}

/// Reads primitive values back out of a borrowed byte slice, advancing an
/// internal cursor.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `bytes`, starting at offset 0.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current cursor position, useful for error messages.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.bytes.len() {
            return Err(CodecError::UnexpectedEnd(self.pos));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let b = self.take(8)?;
        Ok(i64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a big-endian `f64`.
    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        let b = self.take(8)?;
        Ok(f64::from_be_bytes(b.try_into().unwrap()))
    }

    /// Reads a raw byte slice of length `n`.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.take(n)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8(start))
    }

    /// Reads a length-prefixed byte blob.
    pub fn read_blob(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }
}

/// Magic value placed at the start of every instruction so that the encode
/// and decode sides always pair up; a mismatch means the reader has drifted
/// relative to the writer and must fail loudly rather than misinterpret the
/// following bytes.
pub const INSTRUCTION_MAGIC: u16 = 0xc0de;

/// Derives an instruction variant's on-disk class-id from its tag name.
/// Never a hand-assigned ordinal: two variants with the same tag always
/// collide (a programming error caught by `Instruction::add_class`-style
/// assertions in `crate::instruction`), and the id is stable across
/// platforms and Rust versions because `crc32fast` is a pure bit algorithm.
pub fn class_id(tag: &str) -> u32 {
    crc32fast::hash(tag.as_bytes())
}
