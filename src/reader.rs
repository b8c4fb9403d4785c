//! Positional byte reader over an in-memory buffer.
//!
//! Numeric decoding is delegated to `nom`'s fixed-width parsers; the cursor,
//! seeking, and sub-slicing operations around them are hand-rolled, since
//! the format requires random seeks that a streaming combinator chain can't
//! express directly (name-table lookups and properties-offset seeks both
//! jump backward and forward over the same buffer).

use crate::error::{DecodeError, Result};
use nom::number::complete as num;
use uuid::Uuid;

/// A cursor over a borrowed byte slice. Reading never copies the backing
/// buffer; `slice` hands out a sub-reader borrowing the same data.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(self.eof(pos.saturating_sub(self.buf.len())));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    fn eof(&self, requested: usize) -> DecodeError {
        DecodeError::EndOfData {
            requested,
            available: self.remaining(),
            position: self.pos,
        }
    }

    /// Move the cursor by a signed offset. Legal to move backward; used
    /// constantly for name-table lookups and offset seeks.
    pub fn skip(&mut self, n: i64) -> Result<()> {
        let target = self.pos as i64 + n;
        if target < 0 || target as usize > self.buf.len() {
            return Err(self.eof(n.unsigned_abs() as usize));
        }
        self.pos = target as usize;
        Ok(())
    }

    /// Read without advancing the cursor.
    pub fn peek(&self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.eof(n));
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let out = self.peek(n)?;
        self.pos += n;
        Ok(out)
    }

    /// Create a sub-reader over the next `n` bytes, advancing this reader
    /// past them.
    pub fn slice(&mut self, n: usize) -> Result<Reader<'a>> {
        let bytes = self.read_bytes(n)?;
        Ok(Reader::new(bytes))
    }

    fn read_raw<T>(
        &mut self,
        size: usize,
        parser: impl Fn(&'a [u8]) -> nom::IResult<&'a [u8], T>,
    ) -> Result<T> {
        if self.remaining() < size {
            return Err(self.eof(size));
        }
        let slice = &self.buf[self.pos..self.pos + size];
        let (_, value) = parser(slice).map_err(|_| self.eof(size))?;
        self.pos += size;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_raw(1, num::le_u8)
    }
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_raw(1, num::le_i8)
    }
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_raw(2, num::le_u16)
    }
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_raw(2, num::le_i16)
    }
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_raw(4, num::le_u32)
    }
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_raw(4, num::le_i32)
    }
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_raw(8, num::le_u64)
    }
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_raw(8, num::le_i64)
    }
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_raw(4, num::le_f32)
    }
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_raw(8, num::le_f64)
    }

    pub fn read_bool_u8(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }
    pub fn read_bool_u16(&mut self) -> Result<bool> {
        Ok(self.read_u16()? != 0)
    }
    pub fn read_bool_u32(&mut self) -> Result<bool> {
        Ok(self.read_u32()? != 0)
    }

    /// 16-byte little-endian GUID.
    pub fn read_guid(&mut self) -> Result<Uuid> {
        let bytes = self.read_bytes(16)?;
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(Uuid::from_bytes_le(arr))
    }

    /// Signed-int32-length-prefixed string. See `SPEC_FULL.md` §4.1 / testable
    /// property 1 for the exact edge cases.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        match len {
            0 => Ok(String::new()),
            1 => {
                self.skip(1)?;
                Ok(String::new())
            }
            -1 => {
                self.skip(2)?;
                Ok(String::new())
            }
            l if l > 0 => {
                let n = l as usize;
                let bytes = self.read_bytes(n)?;
                Ok(latin1_to_string(&bytes[..n - 1]))
            }
            l => {
                let n = (-l) as usize;
                let bytes = self.read_bytes(n * 2)?;
                let units: Vec<u16> = bytes[..(n - 1) * 2]
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| DecodeError::InvalidString)
            }
        }
    }

    /// Hex dump centered on the current position, for diagnostics.
    pub fn debug_context(&self, before: usize, after: usize) -> String {
        let start = self.pos.saturating_sub(before);
        let end = (self.pos + after).min(self.buf.len());
        let mut out = String::new();
        for (i, byte) in self.buf[start..end].iter().enumerate() {
            if start + i == self.pos {
                out.push_str("[ ");
            }
            out.push_str(&format!("{byte:02x} "));
        }
        out
    }
}

pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_primitives_are_little_endian() {
        let mut r = Reader::new(&[0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(r.read_u32().unwrap(), 1);
        assert_eq!(r.read_i32().unwrap(), -1);
    }

    #[test]
    fn string_length_zero_is_empty() {
        let data = [0i32.to_le_bytes()].concat();
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.position(), 4);
    }

    #[test]
    fn string_length_one_consumes_null_byte() {
        let mut data = 1i32.to_le_bytes().to_vec();
        data.push(0);
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.position(), 5);
    }

    #[test]
    fn string_length_negative_one_consumes_two_bytes() {
        let mut data = (-1i32).to_le_bytes().to_vec();
        data.extend_from_slice(&[0, 0]);
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.position(), 6);
    }

    #[test]
    fn string_positive_length_is_latin1_with_trailing_null() {
        let mut data = 6i32.to_le_bytes().to_vec();
        data.extend_from_slice(b"hello\0");
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), "hello");
    }

    #[test]
    fn string_negative_length_is_utf16_with_trailing_null() {
        let units: Vec<u16> = "hi".encode_utf16().chain(std::iter::once(0)).collect();
        let mut data = (-3i32).to_le_bytes().to_vec();
        for u in units {
            data.extend_from_slice(&u.to_le_bytes());
        }
        let mut r = Reader::new(&data);
        assert_eq!(r.read_string().unwrap(), "hi");
    }

    #[test]
    fn slice_advances_parent_and_borrows_same_data() {
        let data = [1u8, 2, 3, 4, 5];
        let mut r = Reader::new(&data);
        let mut sub = r.slice(3).unwrap();
        assert_eq!(r.position(), 3);
        assert_eq!(sub.read_u8().unwrap(), 1);
    }

    #[test]
    fn eof_on_read_past_buffer() {
        let data = [0u8; 2];
        let mut r = Reader::new(&data);
        assert!(r.read_u32().is_err());
    }

    #[test]
    fn skip_allows_seeking_backward() {
        let data = [1u8, 2, 3, 4];
        let mut r = Reader::new(&data);
        r.read_u32().unwrap();
        r.skip(-2).unwrap();
        assert_eq!(r.position(), 2);
    }
}
