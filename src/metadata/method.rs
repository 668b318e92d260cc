//! Method body headers (ECMA-335 II.25.4).
//!
//! A method body in a module image starts with either a one-byte *tiny* header or a twelve-byte
//! *fat* header, followed by the IL code. [`MethodBody::from`] parses the header and
//! [`MethodBody::code`] cuts the instruction stream out of the raw body so it can be handed to
//! the decoder. Extra data sections after the code are recorded but not parsed.

use bitflags::bitflags;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::token::Token,
    Error::OutOfBounds,
    Result,
};

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy)]
    /// Flags of the first header byte (tiny) or the first header word (fat)
    pub struct MethodBodyFlags: u16 {
        /// Tiny header, code size in the upper six bits
        const TINY_FORMAT = 0x2;
        /// Fat header
        const FAT_FORMAT = 0x3;
        /// Data sections follow the code
        const MORE_SECTS = 0x8;
        /// Locals are zero-initialised
        const INIT_LOCALS = 0x10;
    }
}

/// Parsed method header.
///
/// # Examples
///
/// ```rust
/// use ilscope::metadata::method::MethodBody;
///
/// // tiny header for 2 bytes of code: ldc.i4.0; ret
/// let raw = [0x0A, 0x16, 0x2A];
/// let body = MethodBody::from(&raw)?;
/// assert!(!body.is_fat);
/// assert_eq!(body.code(&raw)?, &[0x16, 0x2A]);
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBody {
    /// Size of the IL code in bytes
    pub size_code: usize,
    /// Size of the header in bytes (1 or 12 and up)
    pub size_header: usize,
    /// Signature of the locals, null if there are none
    pub local_var_sig_token: Token,
    /// Maximum evaluation stack depth (8 for tiny headers)
    pub max_stack: usize,
    /// Header format
    pub is_fat: bool,
    /// `INIT_LOCALS` is set
    pub is_init_local: bool,
    /// `MORE_SECTS` is set; the sections are not parsed
    pub has_sections: bool,
}

impl MethodBody {
    /// Parse the header at the start of `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an empty body or an unknown header format, and
    /// [`crate::Error::OutOfBounds`] if the header or code runs past `data`.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_0000_0011_u8)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: Token::new(0),
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                    has_sections: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                let mut offset = 0_usize;
                let first_duo = read_le_at::<u16>(data, &mut offset)?;
                let max_stack = read_le_at::<u16>(data, &mut offset)? as usize;
                let size_code = read_le_at::<u32>(data, &mut offset)? as usize;
                let local_var_sig_token = Token::new(read_le_at::<u32>(data, &mut offset)?);

                let size_header = usize::from(first_duo >> 12) * 4;
                if size_header < 12 {
                    return Err(malformed_error!(
                        "Fat method header declares {} bytes",
                        size_header
                    ));
                }

                let Some(body_end) = size_header.checked_add(size_code) else {
                    return Err(OutOfBounds);
                };
                if body_end > data.len() {
                    return Err(OutOfBounds);
                }

                let flags_header =
                    MethodBodyFlags::from_bits_truncate(first_duo & 0b_0000_1111_1111_1111_u16);

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token,
                    max_stack,
                    is_fat: true,
                    is_init_local: flags_header.contains(MethodBodyFlags::INIT_LOCALS),
                    has_sections: flags_header.contains(MethodBodyFlags::MORE_SECTS),
                })
            }
            _ => Err(malformed_error!(
                "Unknown method header format 0x{:02X}",
                first_byte
            )),
        }
    }

    /// The IL code inside the raw body this header was parsed from.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than header plus code.
    pub fn code<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.get(self.size_header..self.size_header + self.size_code)
            .ok_or(OutOfBounds)
    }

    /// Total size of header and code.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_header + self.size_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny() {
        // ldstr 0x70000001; call 0x0A00000C; ret
        let data = [
            0x2E, 0x72, 0x01, 0x00, 0x00, 0x70, 0x28, 0x0C, 0x00, 0x00, 0x0A, 0x2A,
        ];

        let body = MethodBody::from(&data).unwrap();

        assert!(!body.is_fat);
        assert_eq!(body.size_header, 1);
        assert_eq!(body.size_code, 11);
        assert_eq!(body.max_stack, 8);
        assert!(body.local_var_sig_token.is_null());
        assert_eq!(body.code(&data).unwrap(), &data[1..]);
        assert_eq!(body.size(), 12);
    }

    #[test]
    fn fat() {
        #[rustfmt::skip]
        let data = [
            0x1B, 0x30, 0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x11,
            0x16, 0x2A,
        ];

        let body = MethodBody::from(&data).unwrap();

        assert!(body.is_fat);
        assert_eq!(body.size_header, 12);
        assert_eq!(body.size_code, 2);
        assert_eq!(body.max_stack, 2);
        assert_eq!(body.local_var_sig_token, Token::new(0x1100_0001));
        assert!(body.is_init_local);
        assert!(body.has_sections);
        assert_eq!(body.code(&data).unwrap(), &[0x16, 0x2A]);
    }

    #[test]
    fn truncated() {
        // tiny header promising 3 bytes of code
        assert!(matches!(MethodBody::from(&[0x0E, 0x00]), Err(OutOfBounds)));

        // fat header cut short
        assert!(matches!(
            MethodBody::from(&[0x03, 0x30, 0x08, 0x00]),
            Err(OutOfBounds)
        ));

        // fat header promising more code than present
        let data = [
            0x03, 0x30, 0x08, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A,
        ];
        assert!(matches!(MethodBody::from(&data), Err(OutOfBounds)));
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            MethodBody::from(&[]),
            Err(crate::Error::Malformed { .. })
        ));
        assert!(matches!(
            MethodBody::from(&[0x01, 0x00]),
            Err(crate::Error::Malformed { .. })
        ));

        // fat header declaring a 4 byte header
        let data = [
            0x03, 0x10, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert!(matches!(
            MethodBody::from(&data),
            Err(crate::Error::Malformed { .. })
        ));
    }
}
