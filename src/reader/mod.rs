#![doc = r#"
Sequential, bounds-checked reading over a byte slice.

Every parsing stage of this crate reads through a [`Reader`]. Reads past
the end of the slice never panic: they return a [`ReaderError`] carrying
the position at which the read was attempted.
"#]

mod error;
pub use error::*;

mod vlq;
pub use vlq::*;

#[doc = r#"
A cursor over an immutable byte slice.

# Example
```rust
# use smfplay::prelude::*;
let mut reader = Reader::from_byte_slice(&[0x00, 0x60, 0x83, 0x60]);
assert_eq!(reader.read_u16_be().unwrap(), 96);
assert_eq!(reader.read_vlq().unwrap(), (480, 2));
assert!(reader.is_empty());
```
"#]
#[derive(Debug, Clone)]
pub struct Reader<'slc> {
    data: &'slc [u8],
    position: usize,
}

impl<'slc> Reader<'slc> {
    /// Create a reader positioned at the start of `data`
    pub const fn from_byte_slice(data: &'slc [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The offset of the next byte to be read
    #[inline]
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// True if every byte has been read
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread part of the slice
    pub fn remaining_slice(&self) -> &'slc [u8] {
        &self.data[self.position..]
    }

    /// Look at the next byte without consuming it
    pub fn peek_next(&self) -> ReadResult<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(ReaderError::oob(self.position))
    }

    /// Read one byte
    pub fn read_next(&mut self) -> ReadResult<u8> {
        let byte = self.peek_next()?;
        self.position += 1;
        Ok(byte)
    }

    /// Read exactly `len` bytes, borrowing them from the underlying slice
    pub fn read_slice(&mut self, len: usize) -> ReadResult<&'slc [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ReaderError::oob(self.position))?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Read exactly `SIZE` bytes into an array
    pub fn read_exact_size<const SIZE: usize>(&mut self) -> ReadResult<[u8; SIZE]> {
        let slice = self.read_slice(SIZE)?;
        let mut out = [0; SIZE];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> ReadResult<()> {
        self.read_slice(len).map(|_| ())
    }

    /// Read a big-endian `u16`
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        self.read_exact_size().map(u16::from_be_bytes)
    }

    /// Read a big-endian 24-bit value
    pub fn read_u24_be(&mut self) -> ReadResult<u32> {
        let [a, b, c] = self.read_exact_size()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    /// Read a big-endian `u32`
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        self.read_exact_size().map(u32::from_be_bytes)
    }

    /// Read a variable length quantity, returning the value and its width in bytes.
    ///
    /// On failure nothing is consumed.
    pub fn read_vlq(&mut self) -> ReadResult<(u32, usize)> {
        match decode_vlq(self.remaining_slice()) {
            Ok((value, width)) => {
                self.position += width;
                Ok((value, width))
            }
            Err(crate::VlqError::Truncated) => Err(ReaderError::oob(self.data.len())),
            Err(e) => Err(ReaderError::invalid(self.position, e)),
        }
    }
}

#[test]
fn reads_big_endian_values() {
    let mut reader = Reader::from_byte_slice(&[0x12, 0x34, 0x07, 0xA1, 0x20, 0, 0, 0, 6]);
    assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
    assert_eq!(reader.read_u24_be().unwrap(), 500_000);
    assert_eq!(reader.read_u32_be().unwrap(), 6);
    assert!(reader.is_empty());
}

#[test]
fn out_of_bounds_reads_report_position() {
    let mut reader = Reader::from_byte_slice(&[1, 2, 3]);
    reader.skip(2).unwrap();
    let err = reader.read_u16_be().unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(err.position(), 2);
    // a failed read consumes nothing
    assert_eq!(reader.read_next().unwrap(), 3);
    assert!(reader.read_next().is_err());
}

#[test]
fn vlq_overflow_is_a_parse_error() {
    let mut reader = Reader::from_byte_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
    let err = reader.read_vlq().unwrap_err();
    assert!(!err.is_out_of_bounds());
    assert_eq!(reader.buffer_position(), 0);
}
