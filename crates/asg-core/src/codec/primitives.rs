//! Primitive encoding/decoding for the graph wire format.
//!
//! Ids, keys and counts are fixed-width little-endian `u32`. Varints appear
//! only in the compressed-stream size prefix.

use crate::error::DecodeError;
use crate::limits::MAX_VARINT_BYTES;
use crate::model::NodeId;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a bool byte, rejecting anything but `0` and `1`.
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(context)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidBool { value }),
        }
    }

    /// Reads a node id; `0` is returned as [`NodeId::NONE`].
    #[inline]
    pub fn read_node_id(&mut self, context: &'static str) -> Result<NodeId, DecodeError> {
        Ok(NodeId(self.read_u32(context)?))
    }

    /// Reads a count and checks it against `max`.
    pub fn read_count(&mut self, max: usize, field: &'static str) -> Result<usize, DecodeError> {
        let len = self.read_u32(field)? as usize;
        if len > max {
            return Err(DecodeError::LengthExceedsLimit { field, len, max });
        }
        Ok(len)
    }

    /// Reads a `u32`-length-prefixed UTF-8 string.
    #[inline]
    pub fn read_string(
        &mut self,
        max_len: usize,
        field: &'static str,
    ) -> Result<String, DecodeError> {
        let len = self.read_count(max_len, field)?;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Reads a run of nonzero ids closed by a `0` terminator.
    pub fn read_id_run(
        &mut self,
        max_len: usize,
        field: &'static str,
    ) -> Result<Vec<NodeId>, DecodeError> {
        let mut ids = Vec::new();
        loop {
            let id = self.read_node_id(field)?;
            if id.is_none() {
                return Ok(ids);
            }
            if ids.len() == max_len {
                return Err(DecodeError::LengthExceedsLimit {
                    field,
                    len: max_len + 1,
                    max: max_len,
                });
            }
            ids.push(id);
        }
    }

    /// Reads an unsigned varint (LEB128).
    #[inline]
    pub fn read_varint(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        let mut result: u64 = 0;
        let mut shift = 0;

        for i in 0..MAX_VARINT_BYTES {
            let byte = self.read_byte(context)?;
            let value = (byte & 0x7F) as u64;

            // Check for overflow
            if shift >= 64 || (shift == 63 && value > 1) {
                return Err(DecodeError::VarintOverflow);
            }

            result |= value << shift;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;

            if i == MAX_VARINT_BYTES - 1 {
                return Err(DecodeError::VarintTooLong);
            }
        }

        Err(DecodeError::VarintTooLong)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    #[inline]
    pub fn write_node_id(&mut self, id: NodeId) {
        self.write_u32(id.0);
    }

    /// Writes a `u32`-length-prefixed UTF-8 string. The caller checks the
    /// length against the format limit.
    pub fn write_string(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes ids followed by the `0` terminator.
    pub fn write_id_run(&mut self, ids: &[NodeId]) {
        for id in ids {
            self.write_node_id(*id);
        }
        self.write_node_id(NodeId::NONE);
    }

    /// Writes an unsigned varint (LEB128).
    #[inline]
    pub fn write_varint(&mut self, mut value: u64) {
        let mut buf = [0u8; 10];
        let mut len = 0;
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            buf[len] = byte;
            len += 1;
            if value == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_little_endian() {
        let mut writer = Writer::new();
        writer.write_u32(0x0403_0201);
        writer.write_u16(0x0605);
        assert_eq!(writer.as_bytes(), &[1, 2, 3, 4, 5, 6]);

        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.read_u32("test").unwrap(), 0x0403_0201);
        assert_eq!(reader.read_u16("test").unwrap(), 0x0605);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_id_run_terminator() {
        let mut writer = Writer::new();
        writer.write_id_run(&[NodeId(7), NodeId(3), NodeId(7)]);
        assert_eq!(writer.len(), 16);
        assert_eq!(&writer.as_bytes()[12..], &[0, 0, 0, 0]);

        let mut reader = Reader::new(writer.as_bytes());
        let ids = reader.read_id_run(10, "test").unwrap();
        assert_eq!(ids, [NodeId(7), NodeId(3), NodeId(7)]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_id_run_missing_terminator() {
        let mut writer = Writer::new();
        writer.write_node_id(NodeId(5));
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_id_run(10, "test"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_id_run_too_long() {
        let mut writer = Writer::new();
        writer.write_id_run(&[NodeId(2), NodeId(3), NodeId(4)]);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_id_run(2, "test"),
            Err(DecodeError::LengthExceedsLimit { max: 2, .. })
        ));
    }

    #[test]
    fn test_string() {
        for s in ["", "Program", "unicode: \u{1F600}"] {
            let mut writer = Writer::new();
            writer.write_string(s);
            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_string(1000, "test").unwrap(), s);
        }
    }

    #[test]
    fn test_string_too_long() {
        let mut writer = Writer::new();
        writer.write_u32(1000);
        writer.write_bytes(&[b'a'; 1000]);

        let mut reader = Reader::new(writer.as_bytes());
        let result = reader.read_string(100, "test");
        assert!(matches!(
            result,
            Err(DecodeError::LengthExceedsLimit { max: 100, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut writer = Writer::new();
        writer.write_u32(2);
        writer.write_bytes(&[0xff, 0xfe]);
        let mut reader = Reader::new(writer.as_bytes());
        assert!(matches!(
            reader.read_string(100, "name"),
            Err(DecodeError::InvalidUtf8 { field: "name" })
        ));
    }

    #[test]
    fn test_bool() {
        let data = [0u8, 1, 2];
        let mut reader = Reader::new(&data);
        assert!(!reader.read_bool("b").unwrap());
        assert!(reader.read_bool("b").unwrap());
        assert!(matches!(
            reader.read_bool("b"),
            Err(DecodeError::InvalidBool { value: 2 })
        ));
    }

    #[test]
    fn test_varint() {
        for v in [0u64, 1, 127, 128, 16384, u32::MAX as u64, u64::MAX] {
            let mut writer = Writer::new();
            writer.write_varint(v);
            let mut reader = Reader::new(writer.as_bytes());
            assert_eq!(reader.read_varint("test").unwrap(), v, "failed for {}", v);
        }
        let data = [0x80u8; 11];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_varint("test"),
            Err(DecodeError::VarintTooLong)
        ));
    }

    #[test]
    fn test_unexpected_eof() {
        let data = [0u8; 3];
        let mut reader = Reader::new(&data);
        assert!(matches!(
            reader.read_u32("node_count"),
            Err(DecodeError::UnexpectedEof { context: "node_count" })
        ));
    }
}
