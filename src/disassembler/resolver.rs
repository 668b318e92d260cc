//! Token resolution for operands.
//!
//! Each token-carrying operand kind accepts a fixed set of tables. [`SymbolResolver`] checks the
//! token's table byte against that set before asking the [`SymbolTable`] for the row, so a
//! `ldfld` pointing at a `TypeDef` fails with [`crate::Error::UnsupportedTokenKind`] rather than
//! resolving to something that is not a field.

use crate::{
    disassembler::{instruction::Operand, opcodes::OperandKind},
    metadata::{
        symbols::{Symbol, SymbolTable},
        tableid::TableId,
        token::Token,
    },
    Error::{NoMetadata, UnsupportedTokenKind},
    Result,
};

/// Tables a token may point into for a given operand kind.
///
/// Non-token kinds accept nothing.
#[must_use]
pub fn accepted_tables(kind: OperandKind) -> &'static [TableId] {
    match kind {
        OperandKind::FieldRef => &[TableId::Field, TableId::MemberRef],
        OperandKind::MethodRef => &[TableId::MethodDef, TableId::MemberRef, TableId::MethodSpec],
        OperandKind::TypeRef => &[TableId::TypeDef, TableId::TypeRef, TableId::TypeSpec],
        OperandKind::SignatureRef => &[TableId::StandAloneSig],
        OperandKind::StringRef => &[TableId::UserString],
        OperandKind::GenericToken => &[
            TableId::MethodDef,
            TableId::MethodSpec,
            TableId::TypeDef,
            TableId::TypeRef,
            TableId::TypeSpec,
            TableId::Field,
            TableId::MemberRef,
        ],
        _ => &[],
    }
}

/// Resolves operand tokens against an optional symbol table.
///
/// # Examples
///
/// ```rust
/// use ilscope::prelude::*;
/// use ilscope::disassembler::{OperandKind, SymbolResolver};
///
/// let mut tables = MetadataTables::new();
/// let field = tables.add_field("count")?;
///
/// let resolver = SymbolResolver::new(Some(&tables));
/// let symbol = resolver.resolve(field, OperandKind::FieldRef)?;
/// assert_eq!(symbol.name(), Some("count"));
///
/// // A field token is not a valid `call` target
/// assert!(resolver.resolve(field, OperandKind::MethodRef).is_err());
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Clone, Copy)]
pub struct SymbolResolver<'a> {
    table: Option<&'a dyn SymbolTable>,
}

impl<'a> SymbolResolver<'a> {
    /// Create a resolver; `None` decodes without metadata.
    #[must_use]
    pub fn new(table: Option<&'a dyn SymbolTable>) -> Self {
        SymbolResolver { table }
    }

    /// The symbol table, if one was supplied.
    #[must_use]
    pub fn table(&self) -> Option<&'a dyn SymbolTable> {
        self.table
    }

    /// Check that `token` may appear in an operand of `kind`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTokenKind`] with the token's table byte otherwise.
    pub fn check(token: Token, kind: OperandKind) -> Result<TableId> {
        match token.kind() {
            Some(table) if accepted_tables(kind).contains(&table) => Ok(table),
            _ => Err(UnsupportedTokenKind(token.table())),
        }
    }

    /// Resolve `token` as an operand of `kind`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTokenKind`] if the token's table is not accepted,
    /// [`crate::Error::NoMetadata`] if there is no symbol table, or whatever the table reports.
    pub fn resolve(&self, token: Token, kind: OperandKind) -> Result<Symbol> {
        let table_id = Self::check(token, kind)?;
        let Some(table) = self.table else {
            return Err(NoMetadata);
        };

        if table_id == TableId::UserString {
            let value = table.user_string(token)?;
            return Ok(Symbol::String { token, value });
        }

        table.resolve_token(token)
    }

    /// Build the operand for a token of `kind`.
    ///
    /// With a symbol table the token is always resolved. Without one, every kind except
    /// [`OperandKind::GenericToken`] degrades to [`Operand::Token`]; `ldtoken` has no useful
    /// unresolved form and fails with [`crate::Error::NoMetadata`].
    ///
    /// # Errors
    /// See [`SymbolResolver::resolve`].
    pub fn operand(&self, token: Token, kind: OperandKind) -> Result<Operand> {
        if self.table.is_none() && kind != OperandKind::GenericToken {
            Self::check(token, kind)?;
            return Ok(Operand::Token(token));
        }

        self.resolve(token, kind).map(Operand::Symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::tables::MetadataTables, Error};

    fn tables() -> MetadataTables {
        let mut tables = MetadataTables::new();
        tables.add_type_def("Demo", "Program").unwrap();
        tables.add_field("count").unwrap();
        tables.add_method_def("Main").unwrap();
        tables.add_member_ref("WriteLine").unwrap();
        tables.add_user_string("hello").unwrap();
        tables.add_standalone_sig(&[0x00, 0x00, 0x01]).unwrap();
        tables
    }

    #[test]
    fn accepted_per_kind() {
        assert_eq!(accepted_tables(OperandKind::FieldRef).len(), 2);
        assert_eq!(accepted_tables(OperandKind::MethodRef).len(), 3);
        assert_eq!(accepted_tables(OperandKind::TypeRef).len(), 3);
        assert_eq!(accepted_tables(OperandKind::GenericToken).len(), 7);
        assert!(accepted_tables(OperandKind::Int32).is_empty());
        assert!(!accepted_tables(OperandKind::GenericToken).contains(&TableId::UserString));
    }

    #[test]
    fn resolves_with_table() {
        let tables = tables();
        let resolver = SymbolResolver::new(Some(&tables));

        let field = resolver.resolve(Token(0x0400_0001), OperandKind::FieldRef).unwrap();
        assert_eq!(field.name(), Some("count"));

        let member = resolver.resolve(Token(0x0A00_0001), OperandKind::FieldRef).unwrap();
        assert_eq!(member.name(), Some("WriteLine"));

        let literal = resolver.resolve(Token(0x7000_0001), OperandKind::StringRef).unwrap();
        assert_eq!(literal.as_str(), Some("hello"));

        let program = resolver.resolve(Token(0x0200_0001), OperandKind::GenericToken).unwrap();
        assert_eq!(program.name(), Some("Demo.Program"));

        let sig = resolver.resolve(Token(0x1100_0001), OperandKind::SignatureRef).unwrap();
        assert!(matches!(sig, Symbol::Signature { .. }));
    }

    #[test]
    fn rejects_wrong_tables() {
        let tables = tables();
        let resolver = SymbolResolver::new(Some(&tables));

        assert!(matches!(
            resolver.resolve(Token(0x0200_0001), OperandKind::FieldRef),
            Err(UnsupportedTokenKind(0x02))
        ));
        assert!(matches!(
            resolver.resolve(Token(0x0600_0001), OperandKind::StringRef),
            Err(UnsupportedTokenKind(0x06))
        ));
        assert!(matches!(
            resolver.resolve(Token(0x7000_0001), OperandKind::GenericToken),
            Err(UnsupportedTokenKind(0x70))
        ));
        assert!(matches!(
            resolver.resolve(Token(0x2300_0001), OperandKind::TypeRef),
            Err(UnsupportedTokenKind(0x23))
        ));
    }

    #[test]
    fn missing_rows_propagate() {
        let tables = tables();
        let resolver = SymbolResolver::new(Some(&tables));

        assert!(matches!(
            resolver.resolve(Token(0x0600_0009), OperandKind::MethodRef),
            Err(Error::TokenNotFound(_))
        ));
    }

    #[test]
    fn without_table() {
        let resolver = SymbolResolver::new(None);

        assert_eq!(
            resolver.operand(Token(0x0A00_0001), OperandKind::MethodRef).unwrap(),
            Operand::Token(Token(0x0A00_0001))
        );
        assert_eq!(
            resolver.operand(Token(0x7000_0001), OperandKind::StringRef).unwrap(),
            Operand::Token(Token(0x7000_0001))
        );
        assert!(matches!(
            resolver.operand(Token(0x0200_0001), OperandKind::GenericToken),
            Err(NoMetadata)
        ));
        assert!(matches!(
            resolver.operand(Token(0x7000_0001), OperandKind::GenericToken),
            Err(UnsupportedTokenKind(0x70))
        ));
        assert!(matches!(
            resolver.operand(Token(0x0200_0001), OperandKind::FieldRef),
            Err(UnsupportedTokenKind(0x02))
        ));
    }

    #[test]
    fn resolve_is_idempotent() {
        let tables = tables();
        let resolver = SymbolResolver::new(Some(&tables));

        let first = resolver.operand(Token(0x0600_0001), OperandKind::MethodRef).unwrap();
        let second = resolver.operand(Token(0x0600_0001), OperandKind::MethodRef).unwrap();
        assert_eq!(first, second);
    }
}
