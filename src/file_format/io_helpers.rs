//! Little-endian primitives for the OSY payload.

use std::convert::TryFrom;

use crate::errors::{DecodeError, EncodeError};

#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> ByteWriter {
        ByteWriter::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn count(&mut self, n: usize) {
        self.u64(n as u64);
    }

    /// `[u16 len][bytes]`.
    pub fn string(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = u16::try_from(s.len()).map_err(|_| EncodeError::StringTooLong { len: s.len() })?;
        self.u16(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

macro_rules! read_le {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty, DecodeError> {
            let bytes = self.take(std::mem::size_of::<$ty>())?;
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(bytes);
            Ok(<$ty>::from_le_bytes(raw))
        }
    };
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> ByteReader<'a> {
        ByteReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    read_le!(u8, u8);
    read_le!(u16, u16);
    read_le!(u32, u32);
    read_le!(i32, i32);
    read_le!(u64, u64);
    read_le!(i64, i64);

    /// Read a record count and reject it up front if `count` records of at
    /// least `min_record_size` bytes cannot fit in what is left.
    pub fn count(&mut self, section: &'static str, min_record_size: usize) -> Result<usize, DecodeError> {
        let count = self.u64()?;
        let remaining = self.remaining();
        let fits = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(min_record_size).map(|bytes| (n, bytes)));
        match fits {
            Some((n, bytes)) if bytes <= remaining => Ok(n),
            _ => Err(DecodeError::CountOverrun {
                section,
                count,
                remaining,
            }),
        }
    }

    pub fn string(&mut self, section: &'static str) -> Result<String, DecodeError> {
        let len = self.u16()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { section, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut w = ByteWriter::new();
        w.u32(0x0102_0304);
        w.i64(-1);
        let bytes = w.into_inner();
        assert_eq!(&bytes[..4], &[4, 3, 2, 1]);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.u32(), Ok(0x0102_0304));
        assert_eq!(r.i64(), Ok(-1));
        assert!(r.is_at_end());
    }

    #[test]
    fn short_reads_fail() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        assert_eq!(
            r.u32(),
            Err(DecodeError::Truncated {
                offset: 0,
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn oversized_counts_fail_before_allocating() {
        let mut w = ByteWriter::new();
        w.u64(1 << 40);
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        assert!(matches!(r.count("nodes", 8), Err(DecodeError::CountOverrun { .. })));
    }

    #[test]
    fn strings_longer_than_u16_are_refused() {
        let mut w = ByteWriter::new();
        let long = "x".repeat(70_000);
        assert!(matches!(w.string(&long), Err(EncodeError::StringTooLong { len: 70_000 })));
    }
}
