//! Metadata tokens.
//!
//! A token is the 4-byte value a CIL operand uses to refer to metadata instead of encoding a
//! literal. The high byte selects the table (or the `#US` heap), the low 24 bits are the row
//! (or the heap offset).
//!
//! ```text
//! 0x0A00002C
//!   ^^         table  0x0A  MemberRef
//!     ^^^^^^   row    0x2C
//! ```

use std::fmt;

use crate::{metadata::tableid::TableId, Result};

/// A 32-bit metadata token.
///
/// # Examples
///
/// ```rust
/// use ilscope::{metadata::tableid::TableId, Token};
///
/// let token = Token::new(0x0600_0001);
/// assert_eq!(token.table(), 0x06);
/// assert_eq!(token.row(), 1);
/// assert_eq!(token.kind(), Some(TableId::MethodDef));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Wrap a raw token value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Build a token from a table and a row.
    ///
    /// Row bits above the low 24 are discarded.
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token((u32::from(table as u8) << 24) | (row & 0x00FF_FFFF))
    }

    /// Build a token from a table and a row, rejecting rows that need more than 24 bits.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `row` is above `0x00FF_FFFF`.
    pub fn try_from_parts(table: TableId, row: u32) -> Result<Self> {
        if row > 0x00FF_FFFF {
            return Err(malformed_error!(
                "Row {:#x} does not fit in a {:?} token",
                row,
                table
            ));
        }

        Ok(Token::from_parts(table, row))
    }

    /// The raw value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table byte.
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The row index, or heap offset for user strings.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// The table this token points into, if it is one this crate knows.
    #[must_use]
    pub fn kind(&self) -> Option<TableId> {
        TableId::from_byte(self.table())
    }

    /// Returns true for the all-zero token.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
