//! Bounds-checked little-endian reads over byte slices.
//!
//! Every multi-byte value in a CIL instruction stream and in the metadata heaps is stored
//! little-endian. [`CilIO`] abstracts over the primitive types that can be read this way, and
//! [`read_le_at`] is the single place that performs the bounds check for all of them.

use crate::{Error::OutOfBounds, Result};

/// A primitive that can be decoded from its little-endian byte representation.
pub trait CilIO: Sized {
    /// Fixed-size byte array backing this type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Read a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a `T` at `offset` and advance `offset` past it.
///
/// `offset` is left untouched on failure.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    let Some(window) = data.get(*offset..end) else {
        return Err(OutOfBounds);
    };

    let Ok(read) = window.try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Append `value` as an ECMA-335 II.23.2 compressed unsigned integer.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for values above `0x1FFF_FFFF`, which have no encoding.
pub fn write_compressed_uint(value: u32, out: &mut Vec<u8>) -> Result<()> {
    match value {
        0..=0x7F => out.push(value as u8),
        0x80..=0x3FFF => out.extend_from_slice(&(0x8000 | value as u16).to_be_bytes()),
        0x4000..=0x1FFF_FFFF => out.extend_from_slice(&(0xC000_0000 | value).to_be_bytes()),
        _ => return Err(malformed_error!("Value {} is too large to compress", value)),
    }

    Ok(())
}
