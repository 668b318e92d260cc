//! Byte-level input for the decoder.
//!
//! - [`io`] holds the bounds-checked little-endian readers every other component builds on.
//! - [`cursor::Cursor`] is the position-tracking view the instruction decoder drives.
//! - [`File`] owns raw input, either copied into memory or memory-mapped from disk, and hands
//!   out borrowed windows of it.

pub mod cursor;
pub mod io;

mod memory;
mod physical;

use std::path::Path;

use crate::Result;
use memory::Memory;
use physical::Physical;

/// Storage behind a [`File`].
pub trait Backend: Send + Sync {
    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range does not lie within the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// The complete data.
    fn data(&self) -> &[u8];

    /// Total size in bytes.
    fn len(&self) -> usize;
}

/// Checked `data[offset..offset + len]`, shared by the backends.
fn checked_window(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let Some(end) = offset.checked_add(len) else {
        return Err(crate::Error::OutOfBounds);
    };

    data.get(offset..end).ok_or(crate::Error::OutOfBounds)
}

/// Raw input loaded from disk or memory.
///
/// `File` does not interpret its content; callers pick out instruction streams or method
/// bodies with [`File::data_slice`].
///
/// # Examples
///
/// ```rust
/// use ilscope::File;
///
/// let file = File::from_mem(vec![0x16, 0x2A])?;
/// assert_eq!(file.len(), 2);
/// assert_eq!(file.data_slice(1, 1)?, &[0x2A]);
/// # Ok::<(), ilscope::Error>(())
/// ```
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-map a file from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;
        log::debug!("mapped {} ({} bytes)", file.display(), input.len());

        Ok(File {
            data: Box::new(input),
        })
    }

    /// Wrap an in-memory buffer.
    ///
    /// # Errors
    /// Infallible today, kept fallible to match [`File::from_file`].
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Ok(File {
            data: Box::new(Memory::new(data)),
        })
    }

    /// Total size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the input holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complete input.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// `len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range does not lie within the input.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_checks() {
        let data = [1_u8, 2, 3, 4];
        assert_eq!(checked_window(&data, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(checked_window(&data, 4, 0).unwrap(), &[] as &[u8]);
        assert!(checked_window(&data, 3, 2).is_err());
        assert!(checked_window(&data, usize::MAX, 1).is_err());
    }

    #[test]
    fn from_mem() {
        let file = File::from_mem(vec![0x00, 0x2A]).unwrap();
        assert_eq!(file.len(), 2);
        assert!(!file.is_empty());
        assert_eq!(file.data(), &[0x00, 0x2A]);
        assert!(file.data_slice(1, 2).is_err());
    }

    #[test]
    fn from_file() {
        let path = std::env::temp_dir().join("ilscope_file_from_file.bin");
        std::fs::write(&path, [0x16, 0x2A]).unwrap();

        let file = File::from_file(&path).unwrap();
        assert_eq!(file.data(), &[0x16, 0x2A]);

        std::fs::remove_file(&path).unwrap();
    }
}
