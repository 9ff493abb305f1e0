// Bounds-checked sequential reader over acquisition file bytes

use thiserror::Error;

use super::types::Endianness;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("incomplete data: expected {expected} bytes, {remaining} remain")]
    IncompleteData { expected: usize, remaining: usize },
}

pub type Result<T> = std::result::Result<T, CursorError>;

/// Forward-only cursor over a byte slice.
///
/// Every read either consumes exactly its width or fails without moving the
/// position. The position never goes backward.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    order: Endianness,
}

impl<'a> ByteCursor<'a> {
    /// Cursor with the default (little-endian) byte order.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data, Endianness::default())
    }

    pub fn with_order(data: &'a [u8], order: Endianness) -> Self {
        ByteCursor { data, pos: 0, order }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if remaining < n {
            return Err(CursorError::IncompleteData { expected: n, remaining });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        let raw = [b[0], b[1]];
        Ok(match self.order {
            Endianness::Big => u16::from_be_bytes(raw),
            Endianness::Little => u16::from_le_bytes(raw),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        let raw = [b[0], b[1], b[2], b[3]];
        Ok(match self.order {
            Endianness::Big => u32::from_be_bytes(raw),
            Endianness::Little => u32::from_le_bytes(raw),
        })
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        let raw = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        Ok(match self.order {
            Endianness::Big => f64::from_be_bytes(raw),
            Endianness::Little => f64::from_le_bytes(raw),
        })
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_u32_array<const N: usize>(&mut self) -> Result<[u32; N]> {
        let mut out = [0u32; N];
        for slot in &mut out {
            *slot = self.read_u32()?;
        }
        Ok(out)
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0f32; N];
        for slot in &mut out {
            *slot = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a fixed-width string field.
    ///
    /// The logical value ends at the first NUL byte, or spans the full width
    /// when none is present. Trailing ASCII spaces are stripped backward from
    /// that end; anything before it is kept as-is.
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let raw = self.take(width)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let mut text = &raw[..end];
        while let [head @ .., b' '] = text {
            text = head;
        }
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    /// Consume and return everything that has not been read yet.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}
