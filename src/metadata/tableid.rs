//! Identifiers for the metadata tables reachable from instruction operands.

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// The metadata tables a CIL operand token can point into.
///
/// The discriminant is the token's high byte. [`TableId::UserString`] is not a table but the
/// `#US` heap; `ldstr` tokens use it so the low 24 bits become a heap offset.
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
pub enum TableId {
    /// Reference to a type in another module
    TypeRef = 0x01,
    /// Type defined in this module
    TypeDef = 0x02,
    /// Field defined in this module
    Field = 0x04,
    /// Method defined in this module
    MethodDef = 0x06,
    /// Reference to a field or method through its parent
    MemberRef = 0x0A,
    /// Stand-alone signature, used by `calli`
    StandAloneSig = 0x11,
    /// Constructed type (generic instance, array, pointer)
    TypeSpec = 0x1B,
    /// Generic method instantiation
    MethodSpec = 0x2B,
    /// Offset into the `#US` heap
    UserString = 0x70,
}

impl TableId {
    /// Map a token's high byte to its table.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<TableId> {
        TableId::iter().find(|id| *id as u8 == byte)
    }
}
