//! # Byte Codec
//!
//! Little-endian primitives over a growable write buffer and a borrowed
//! read cursor. Pod records are copied as raw bytes.

use bytemuck::{bytes_of, Pod};

use crate::error::{SnapshotError, SnapshotResult};

/// Append-only snapshot buffer.
#[derive(Clone, Debug, Default)]
pub struct SnapshotWriter {
    buffer: Vec<u8>,
}

impl SnapshotWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The bytes written so far.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u64 in little-endian format.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes raw bytes without a length prefix.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a Pod type directly.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) {
        self.buffer.extend_from_slice(bytes_of(value));
    }

    /// Writes a u32 length followed by the UTF-8 bytes of `value`.
    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buffer.extend_from_slice(value.as_bytes());
    }
}

/// Cursor over snapshot bytes.
#[derive(Clone, Debug)]
pub struct SnapshotReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> SnapshotReader<'a> {
    /// Creates a reader at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Number of bytes read so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> SnapshotResult<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(SnapshotError::UnexpectedEof {
                needed: len,
                remaining,
            });
        }
        let buffer: &'a [u8] = self.buffer;
        let bytes = &buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> SnapshotResult<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns error at the end of the buffer.
    #[inline]
    pub fn read_u8(&mut self) -> SnapshotResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a u32 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 4 bytes remain.
    #[inline]
    pub fn read_u32(&mut self) -> SnapshotResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a u64 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 8 bytes remain.
    #[inline]
    pub fn read_u64(&mut self) -> SnapshotResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads a f32 in little-endian format.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than 4 bytes remain.
    #[inline]
    pub fn read_f32(&mut self) -> SnapshotResult<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Reads a Pod type directly.
    ///
    /// # Errors
    ///
    /// Returns error if the buffer is too short for `T`.
    #[inline]
    pub fn read_pod<T: Pod>(&mut self) -> SnapshotResult<T> {
        let bytes = self.read_bytes(std::mem::size_of::<T>())?;
        bytemuck::try_pod_read_unaligned(bytes)
            .map_err(|err| SnapshotError::InvalidRecord(err.to_string()))
    }

    /// Reads a string written by [`SnapshotWriter::write_str`].
    ///
    /// # Errors
    ///
    /// Returns error if the buffer is truncated or the bytes are not UTF-8.
    pub fn read_str(&mut self) -> SnapshotResult<&'a str> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|err| SnapshotError::InvalidRecord(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_little_endian() {
        let mut writer = SnapshotWriter::new();
        writer.write_u32(0x0403_0201);
        writer.write_u8(9);
        assert_eq!(writer.as_slice(), &[1, 2, 3, 4, 9]);
    }

    #[test]
    fn test_reader_follows_writer() {
        let mut writer = SnapshotWriter::new();
        writer.write_u64(u64::MAX - 1);
        writer.write_f32(-2.5);
        writer.write_str("löwe");
        let bytes = writer.into_inner();

        let mut reader = SnapshotReader::new(&bytes);
        assert_eq!(reader.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(reader.read_f32().unwrap(), -2.5);
        assert_eq!(reader.read_str().unwrap(), "löwe");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_read() {
        let mut reader = SnapshotReader::new(&[1, 2]);
        assert_eq!(
            reader.read_u32(),
            Err(SnapshotError::UnexpectedEof { needed: 4, remaining: 2 })
        );
        // a failed read consumes nothing
        assert_eq!(reader.remaining(), 2);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut writer = SnapshotWriter::new();
        writer.write_u32(2);
        writer.write_bytes(&[0xff, 0xfe]);
        let bytes = writer.into_inner();
        assert!(matches!(
            SnapshotReader::new(&bytes).read_str(),
            Err(SnapshotError::InvalidRecord(_))
        ));
    }
}
