use widestring::U16Str;

use crate::{file::cursor::Cursor, Error::OutOfBounds, Result};

/// The `#US` heap.
///
/// Every entry is a compressed length followed by that many bytes: UTF-16LE code units and a
/// single trailing byte that flags strings needing special handling. Tokens used by `ldstr` are
/// `0x70000000 | offset` into this heap.
///
/// ```rust
/// use ilscope::metadata::streams::UserStrings;
///
/// // "hi": length 5 = 4 bytes of UTF-16 + 1 flag byte
/// let data = [0x00, 0x05, b'h', 0x00, b'i', 0x00, 0x00];
/// let heap = UserStrings::from(&data)?;
/// assert_eq!(heap.get(1)?, "hi");
/// # Ok::<(), ilscope::Error>(())
/// ```
pub struct UserStrings<'a> {
    data: &'a [u8],
}

impl<'a> UserStrings<'a> {
    /// Wrap heap data.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap is empty or does not start with `0`.
    pub fn from(data: &'a [u8]) -> Result<UserStrings<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #US heap is empty"));
        }

        Ok(UserStrings { data })
    }

    /// Decode the literal starting at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the entry runs past the heap, or
    /// [`crate::Error::Malformed`] if it is not valid UTF-16.
    pub fn get(&self, index: usize) -> Result<String> {
        let Some(tail) = self.data.get(index..) else {
            return Err(OutOfBounds);
        };

        let mut cursor = Cursor::new(tail);
        let len = cursor.read_compressed_uint()? as usize;
        let entry = cursor.read_bytes(len)?;

        // Odd lengths carry the trailing flag byte
        let units: Vec<u16> = entry[..len & !1]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        U16Str::from_slice(&units)
            .to_string()
            .map_err(|_| malformed_error!("Invalid string from index - {}", index))
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds only the leading empty entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }
}
