//! Position-tracking reader over a borrowed byte slice.
//!
//! [`Cursor`] drives the instruction decoder and the heap readers. It never owns its data and
//! never moves past the end of the slice: a read either succeeds completely and advances, or
//! fails and leaves the position untouched.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::Cursor;
//!
//! let data = [0x20, 0x2A, 0x00, 0x00, 0x00];
//! let mut cursor = Cursor::new(&data);
//!
//! assert_eq!(cursor.read_le::<u8>()?, 0x20);
//! assert_eq!(cursor.read_le::<i32>()?, 42);
//! assert!(!cursor.has_more_data());
//!
//! cursor.reset();
//! assert_eq!(cursor.pos(), 0);
//! # Ok::<(), ilscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    Error::OutOfBounds,
    Result,
};

/// A borrowed byte slice together with a read position.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at position 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    /// Length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Bytes left between the position and the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Returns true while at least one byte is left to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// The complete underlying data, independent of the position.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Rewind to the start of the data.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Move to an absolute position.
    ///
    /// Seeking to `len()` is allowed and leaves the cursor exhausted.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Read a little-endian primitive and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough bytes remain.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow the next `count` bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(OutOfBounds);
        }

        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read an ECMA-335 II.23.2 compressed unsigned integer.
    ///
    /// | first byte  | size | value bits |
    /// |-------------|------|------------|
    /// | `0xxxxxxx`  | 1    | 7          |
    /// | `10xxxxxx`  | 2    | 14         |
    /// | `110xxxxx`  | 4    | 29         |
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the encoding is cut short, or
    /// [`crate::Error::Malformed`] for an invalid leading byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let start = self.position;
        let first = self.read_le::<u8>()?;

        let value = if first & 0x80 == 0 {
            Ok(u32::from(first))
        } else if first & 0xC0 == 0x80 {
            self.read_le::<u8>()
                .map(|second| (u32::from(first & 0x3F) << 8) | u32::from(second))
        } else if first & 0xE0 == 0xC0 {
            self.read_bytes(3).map(|rest| {
                (u32::from(first & 0x1F) << 24)
                    | (u32::from(rest[0]) << 16)
                    | (u32::from(rest[1]) << 8)
                    | u32::from(rest[2])
            })
        } else {
            Err(malformed_error!(
                "Invalid compressed integer prefix 0x{:02X} at {}",
                first,
                start
            ))
        };

        if value.is_err() {
            self.position = start;
        }
        value
    }
}
