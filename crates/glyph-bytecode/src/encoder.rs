//! Little-endian metadata writer and reader
//!
//! Strings are written as a `u16` code-point count followed by one `u32`
//! per code point. Package names are the exception: a `u16` byte length
//! plus one, the UTF-8 bytes and a 0x00 terminator.

use crate::error::{DecodeError, SerializeError};

/// Metadata writer
///
/// Appends fixed-width little-endian fields to a binary buffer.
#[derive(Debug, Default)]
pub struct MetadataWriter {
    pub(crate) buffer: Vec<u8>,
}

impl MetadataWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new writer with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Get the bytes written so far
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return its buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get the current offset
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit unsigned integer (little-endian)
    pub fn emit_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit unsigned integer (little-endian)
    pub fn emit_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit raw bytes
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Emit a boolean as one byte
    pub fn emit_bool(&mut self, value: bool) {
        self.emit_u8(u8::from(value));
    }

    /// Emit a count that must fit a `u8`
    pub fn emit_count_u8(&mut self, what: &'static str, count: usize) -> Result<(), SerializeError> {
        let value = u8::try_from(count).map_err(|_| SerializeError::LimitExceeded {
            what,
            limit: u8::MAX as usize,
            actual: count,
        })?;
        self.emit_u8(value);
        Ok(())
    }

    /// Emit a count that must fit a `u16`
    pub fn emit_count_u16(&mut self, what: &'static str, count: usize) -> Result<(), SerializeError> {
        self.emit_u16(fit_u16(what, count)?);
        Ok(())
    }

    /// Emit a string as code points
    pub fn emit_string(&mut self, value: &str) -> Result<(), SerializeError> {
        let count = value.chars().count();
        self.emit_count_u16("string code points", count)?;
        for c in value.chars() {
            self.emit_u32(c as u32);
        }
        Ok(())
    }

    /// Emit a package name: byte length plus one, bytes, terminator
    pub fn emit_package_name(&mut self, name: &str) -> Result<(), SerializeError> {
        self.emit_count_u16("package name bytes", name.len() + 1)?;
        self.emit_bytes(name.as_bytes());
        self.emit_u8(0);
        Ok(())
    }
}

/// Narrow a count to `u16`
pub(crate) fn fit_u16(what: &'static str, count: usize) -> Result<u16, SerializeError> {
    u16::try_from(count).map_err(|_| SerializeError::LimitExceeded {
        what,
        limit: u16::MAX as usize,
        actual: count,
    })
}

/// Metadata reader
pub struct MetadataReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> MetadataReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get the current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the remaining bytes in the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there are more bytes to read
    pub fn has_more(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.position + N;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.position = end;
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a 16-bit unsigned integer (little-endian)
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    /// Read a 32-bit unsigned integer (little-endian)
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    /// Read a boolean byte
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a fixed number of bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, DecodeError> {
        let end = self.position + count;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or(DecodeError::UnexpectedEnd(self.position))?
            .to_vec();
        self.position = end;
        Ok(bytes)
    }

    /// Read a code-point string
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let count = self.read_u16()? as usize;
        let mut out = String::with_capacity(count);
        for _ in 0..count {
            let offset = self.position;
            let value = self.read_u32()?;
            let c = char::from_u32(value).ok_or(DecodeError::InvalidCodePoint { value, offset })?;
            out.push(c);
        }
        Ok(out)
    }

    /// Read a package name
    pub fn read_package_name(&mut self) -> Result<String, DecodeError> {
        let start = self.position;
        let length = self.read_u16()? as usize;
        if length == 0 {
            return Err(DecodeError::MalformedName(start));
        }
        let bytes = self.read_bytes(length - 1)?;
        if self.read_u8()? != 0 {
            return Err(DecodeError::MalformedName(start));
        }
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8(start + 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_emission() {
        let mut writer = MetadataWriter::new();
        writer.emit_u8(0x42);
        writer.emit_u16(0x1234);
        writer.emit_u32(0xABCD_EF01);

        let bytes = writer.buffer();
        assert_eq!(bytes[0], 0x42);
        assert_eq!(bytes[1], 0x34); // Little-endian
        assert_eq!(bytes[2], 0x12);
        assert_eq!(bytes[3], 0x01);
        assert_eq!(bytes[4], 0xEF);
        assert_eq!(bytes[5], 0xCD);
        assert_eq!(bytes[6], 0xAB);
    }

    #[test]
    fn test_strings_are_code_points() {
        let mut writer = MetadataWriter::new();
        writer.emit_string("a🍇").unwrap();
        assert_eq!(writer.offset(), 2 + 4 * 2);
        assert_eq!(&writer.buffer()[..2], &[2, 0]);
        assert_eq!(&writer.buffer()[6..10], &0x1F347u32.to_le_bytes());

        let mut reader = MetadataReader::new(writer.buffer());
        assert_eq!(reader.read_string().unwrap(), "a🍇");
        assert!(!reader.has_more());
    }

    #[test]
    fn test_package_name_layout() {
        let mut writer = MetadataWriter::new();
        writer.emit_package_name("s").unwrap();
        assert_eq!(writer.buffer(), &[2, 0, b's', 0]);

        let mut reader = MetadataReader::new(writer.buffer());
        assert_eq!(reader.read_package_name().unwrap(), "s");
    }

    #[test]
    fn test_count_limits() {
        let mut writer = MetadataWriter::new();
        assert!(writer.emit_count_u8("arguments", 255).is_ok());
        assert_eq!(
            writer.emit_count_u8("arguments", 256),
            Err(SerializeError::LimitExceeded {
                what: "arguments",
                limit: 255,
                actual: 256
            })
        );
        assert!(writer.emit_count_u16("methods", 70_000).is_err());
    }

    #[test]
    fn test_unexpected_end() {
        let mut reader = MetadataReader::new(&[0x01]);
        assert_eq!(reader.read_u16(), Err(DecodeError::UnexpectedEnd(0)));
        assert_eq!(reader.read_u8(), Ok(1));
        assert_eq!(reader.read_u8(), Err(DecodeError::UnexpectedEnd(1)));
    }

    #[test]
    fn test_invalid_code_point() {
        let mut writer = MetadataWriter::new();
        writer.emit_u16(1);
        writer.emit_u32(0xD800);
        let mut reader = MetadataReader::new(writer.buffer());
        assert_eq!(
            reader.read_string(),
            Err(DecodeError::InvalidCodePoint {
                value: 0xD800,
                offset: 2
            })
        );
    }
}
