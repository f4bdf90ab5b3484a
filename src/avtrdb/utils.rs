//! Low-level byte reading utilities

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::types::error::{AvtrdbError, Result};

/// Sequential, bounds-checked reader over an immutable byte buffer.
///
/// Every read either consumes exactly what it asked for or fails with
/// [`AvtrdbError::OutOfData`]. After a failure the position is unspecified
/// and the cursor must be discarded along with the rest of the decode.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.position).ok_or(AvtrdbError::OutOfData {
            offset: self.position,
            requested: 1,
            remaining: 0,
        })?;
        self.position += 1;
        Ok(byte)
    }

    /// Reads the next `n` bytes as a slice borrowed from the buffer.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.out_of_data(n));
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a 3-byte big-endian unsigned integer.
    pub fn read_int24(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(3)?;
        Ok(BigEndian::read_u24(bytes))
    }

    /// Reads `n` signed 32-bit little-endian integers.
    pub fn read_int32_array(&mut self, n: usize) -> Result<Vec<i32>> {
        let len = n.checked_mul(4).ok_or_else(|| self.out_of_data(usize::MAX))?;
        let bytes = self.read_bytes(len)?;
        let mut values = vec![0i32; n];
        LittleEndian::read_i32_into(bytes, &mut values);
        Ok(values)
    }

    /// Consumes and returns everything left in the buffer.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.position..];
        self.position = self.data.len();
        rest
    }

    fn out_of_data(&self, requested: usize) -> AvtrdbError {
        AvtrdbError::OutOfData {
            offset: self.position,
            requested,
            remaining: self.remaining(),
        }
    }
}

/// Reverses the character order of a wire string.
///
/// Every text field of both feed formats is stored reversed.
pub fn unreverse(text: &str) -> String {
    text.chars().rev().collect()
}
