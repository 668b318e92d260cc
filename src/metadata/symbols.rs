//! Resolved symbols and the symbol table interface.
//!
//! [`SymbolTable`] is the read-only view of a module's metadata that the decoder resolves
//! tokens against. A module loader implements it over whatever representation it keeps;
//! [`crate::metadata::tables::MetadataTables`] is the bundled in-memory implementation.

use std::fmt;

use crate::{metadata::token::Token, Result};

/// A metadata entity an operand token resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A method, either defined here or instantiated from a generic definition
    Method {
        /// The token that was resolved
        token: Token,
        /// Method name
        name: String,
    },
    /// A field defined in this module
    Field {
        /// The token that was resolved
        token: Token,
        /// Field name
        name: String,
    },
    /// A type definition, reference or specification
    Type {
        /// The token that was resolved
        token: Token,
        /// Namespace-qualified name; constructed types have none
        name: Option<String>,
    },
    /// A field or method referenced through its parent
    Member {
        /// The token that was resolved
        token: Token,
        /// Member name
        name: String,
    },
    /// A stand-alone signature
    Signature {
        /// The token that was resolved
        token: Token,
        /// Raw signature blob
        blob: Vec<u8>,
    },
    /// A string literal from the `#US` heap
    String {
        /// The token that was resolved
        token: Token,
        /// Decoded text
        value: String,
    },
}

impl Symbol {
    /// The token this symbol was resolved from.
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            Symbol::Method { token, .. }
            | Symbol::Field { token, .. }
            | Symbol::Type { token, .. }
            | Symbol::Member { token, .. }
            | Symbol::Signature { token, .. }
            | Symbol::String { token, .. } => *token,
        }
    }

    /// The display name, for symbols that have one.
    ///
    /// String literals and signatures have no name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Symbol::Method { name, .. }
            | Symbol::Field { name, .. }
            | Symbol::Member { name, .. } => Some(name),
            Symbol::Type { name, .. } => name.as_deref(),
            Symbol::Signature { .. } | Symbol::String { .. } => None,
        }
    }

    /// The text of a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Symbol::String { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// A symbol on its own displays as the token it was resolved from; names are only shown
/// when rendering against a symbol table.
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Read-only access to a module's metadata.
///
/// Implementations must be pure: resolving the same token twice yields the same result.
/// The trait requires `Sync` so one table can serve many concurrent decodes.
pub trait SymbolTable: Sync {
    /// Resolve a table token (field, method, type, member, signature) to its symbol.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTokenKind`] for a table the implementation does not
    /// know, and [`crate::Error::TokenNotFound`] for a row that does not exist.
    fn resolve_token(&self, token: Token) -> Result<Symbol>;

    /// Fetch the literal a `ldstr` token refers to.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTokenKind`] if `token` is not a user-string token,
    /// and [`crate::Error::TokenNotFound`] if no literal starts at its offset.
    fn user_string(&self, token: Token) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        let method = Symbol::Method {
            token: Token(0x0600_0001),
            name: "Main".to_string(),
        };
        assert_eq!(method.name(), Some("Main"));
        assert_eq!(method.token(), Token(0x0600_0001));
        assert_eq!(method.as_str(), None);

        let spec = Symbol::Type {
            token: Token(0x1B00_0001),
            name: None,
        };
        assert_eq!(spec.name(), None);

        let literal = Symbol::String {
            token: Token(0x7000_0001),
            value: "hello".to_string(),
        };
        assert_eq!(literal.name(), None);
        assert_eq!(literal.as_str(), Some("hello"));
    }

    #[test]
    fn display() {
        let field = Symbol::Field {
            token: Token(0x0400_0002),
            name: "count".to_string(),
        };
        assert_eq!(field.to_string(), "0x04000002");

        let literal = Symbol::String {
            token: Token(0x7000_0001),
            value: "hello".to_string(),
        };
        assert_eq!(literal.to_string(), "0x70000001");

        let signature = Symbol::Signature {
            token: Token(0x1100_0001),
            blob: vec![0x07, 0x01, 0x08],
        };
        assert_eq!(signature.to_string(), "0x11000001");
    }
}
