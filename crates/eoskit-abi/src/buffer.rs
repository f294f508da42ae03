//! Binary read/write primitives for the wire format.
//!
//! Fixed-width integers are little-endian; variable-width integers use
//! LEB128 (`varuint32`) and zigzag LEB128 (`varint32`); strings and byte
//! blobs are length-prefixed with a `varuint32`.

use crate::error::SerializationError;

/// Append-only writer over a byte vector.
#[derive(Debug, Default)]
pub struct SerialWriter {
    bytes: Vec<u8>,
}

impl SerialWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn push_byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn push_u16(&mut self, v: u16) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_u32(&mut self, v: u32) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_u64(&mut self, v: u64) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_u128(&mut self, v: u128) {
        self.push_bytes(&v.to_le_bytes());
    }

    pub fn push_varuint32(&mut self, mut v: u32) {
        loop {
            let mut b = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                b |= 0x80;
            }
            self.bytes.push(b);
            if v == 0 {
                break;
            }
        }
    }

    pub fn push_varint32(&mut self, v: i32) {
        // zigzag encoding
        self.push_varuint32(((v << 1) ^ (v >> 31)) as u32);
    }

    pub fn push_length_prefixed(&mut self, bytes: &[u8]) {
        self.push_varuint32(bytes.len() as u32);
        self.push_bytes(bytes);
    }
}

/// Cursor-based reader over a byte slice.
#[derive(Debug)]
pub struct SerialReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SerialReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes remaining past the cursor.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn read_byte(&mut self) -> Result<u8, SerializationError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(SerializationError::Truncated { what: "byte" })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SerializationError> {
        if self.remaining() < len {
            return Err(SerializationError::Truncated { what: "byte run" });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u16(&mut self) -> Result<u16, SerializationError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, SerializationError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, SerializationError> {
        let b = self.read_bytes(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    pub fn read_u128(&mut self) -> Result<u128, SerializationError> {
        let b = self.read_bytes(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(b);
        Ok(u128::from_le_bytes(arr))
    }

    pub fn read_varuint32(&mut self) -> Result<u32, SerializationError> {
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            let b = self.read_byte()?;
            result |= ((b & 0x7f) as u64) << shift;
            shift += 7;
            if b & 0x80 == 0 {
                break;
            }
            if shift >= 35 {
                return Err(SerializationError::InvalidValue {
                    type_name: "varuint32".into(),
                    reason: "encoding longer than 5 bytes".into(),
                });
            }
        }
        if result > u32::MAX as u64 {
            return Err(SerializationError::InvalidValue {
                type_name: "varuint32".into(),
                reason: "value exceeds 32 bits".into(),
            });
        }
        Ok(result as u32)
    }

    pub fn read_varint32(&mut self) -> Result<i32, SerializationError> {
        let v = self.read_varuint32()?;
        Ok(((v >> 1) as i32) ^ -((v & 1) as i32))
    }

    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], SerializationError> {
        let len = self.read_varuint32()? as usize;
        self.read_bytes(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varuint_round_trip(v: u32) -> usize {
        let mut w = SerialWriter::new();
        w.push_varuint32(v);
        let bytes = w.into_bytes();
        let mut r = SerialReader::new(&bytes);
        assert_eq!(r.read_varuint32().unwrap(), v);
        assert_eq!(r.remaining(), 0);
        bytes.len()
    }

    #[test]
    fn varuint32_boundaries() {
        assert_eq!(varuint_round_trip(0), 1);
        assert_eq!(varuint_round_trip(127), 1);
        assert_eq!(varuint_round_trip(128), 2);
        assert_eq!(varuint_round_trip(0x3fff), 2);
        assert_eq!(varuint_round_trip(0x4000), 3);
        assert_eq!(varuint_round_trip(u32::MAX), 5);
    }

    #[test]
    fn varint32_zigzag() {
        for v in [0i32, -1, 1, -2, i32::MIN, i32::MAX] {
            let mut w = SerialWriter::new();
            w.push_varint32(v);
            let bytes = w.into_bytes();
            let mut r = SerialReader::new(&bytes);
            assert_eq!(r.read_varint32().unwrap(), v);
        }
    }

    #[test]
    fn truncated_reads_fail() {
        let mut r = SerialReader::new(&[0x01]);
        assert!(r.read_u32().is_err());

        let mut r = SerialReader::new(&[0x05, 0x61, 0x62]);
        assert!(r.read_length_prefixed().is_err());
    }

    #[test]
    fn length_prefixed_round_trip() {
        let mut w = SerialWriter::new();
        w.push_length_prefixed(b"hello");
        let bytes = w.into_bytes();
        let mut r = SerialReader::new(&bytes);
        assert_eq!(r.read_length_prefixed().unwrap(), b"hello");
    }

    #[test]
    fn overlong_varuint_rejected() {
        let mut r = SerialReader::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(r.read_varuint32().is_err());
    }
}
