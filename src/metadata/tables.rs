//! In-memory metadata tables.
//!
//! [`MetadataTables`] keeps the rows a CIL operand can refer to, each holding indices into the
//! `#Strings`, `#US` and `#Blob` heaps it owns. Lookups go through the borrowed heap views in
//! [`crate::metadata::streams`], so every read is bounds-checked against the heap it comes from.
//!
//! Tables can be filled two ways:
//! - [`MetadataTables::from_heaps`] takes heap bytes lifted out of a module image, after which
//!   rows are pushed with raw heap indices ([`MetadataTables::push`]).
//! - The `add_*` helpers intern names and literals into the heaps and push the row in one step,
//!   which is what tooling and tests usually want.

use std::collections::HashMap;

use crate::{
    file::io::write_compressed_uint,
    metadata::{
        streams::{Blob, Strings, UserStrings},
        symbols::{Symbol, SymbolTable},
        tableid::TableId,
        token::Token,
    },
    Error::{OutOfBounds, TokenNotFound, UnsupportedTokenKind},
    Result,
};

/// One row of a metadata table, reduced to the columns needed to name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    /// `TypeRef`: namespace and name in `#Strings`
    TypeRef {
        /// `#Strings` index of the namespace
        namespace: u32,
        /// `#Strings` index of the name
        name: u32,
    },
    /// `TypeDef`: namespace and name in `#Strings`
    TypeDef {
        /// `#Strings` index of the namespace
        namespace: u32,
        /// `#Strings` index of the name
        name: u32,
    },
    /// `Field`: name in `#Strings`
    Field {
        /// `#Strings` index of the name
        name: u32,
    },
    /// `MethodDef`: name in `#Strings`
    MethodDef {
        /// `#Strings` index of the name
        name: u32,
    },
    /// `MemberRef`: name in `#Strings`
    MemberRef {
        /// `#Strings` index of the name
        name: u32,
    },
    /// `StandAloneSig`: signature in `#Blob`
    StandAloneSig {
        /// `#Blob` index of the signature
        signature: u32,
    },
    /// `TypeSpec`: signature in `#Blob`
    TypeSpec {
        /// `#Blob` index of the signature
        signature: u32,
    },
    /// `MethodSpec`: the generic method and its instantiation
    MethodSpec {
        /// `MethodDef` or `MemberRef` token of the generic method
        method: Token,
        /// `#Blob` index of the instantiation signature
        instantiation: u32,
    },
}

impl Row {
    /// The table this row belongs to.
    #[must_use]
    pub fn table(&self) -> TableId {
        match self {
            Row::TypeRef { .. } => TableId::TypeRef,
            Row::TypeDef { .. } => TableId::TypeDef,
            Row::Field { .. } => TableId::Field,
            Row::MethodDef { .. } => TableId::MethodDef,
            Row::MemberRef { .. } => TableId::MemberRef,
            Row::StandAloneSig { .. } => TableId::StandAloneSig,
            Row::TypeSpec { .. } => TableId::TypeSpec,
            Row::MethodSpec { .. } => TableId::MethodSpec,
        }
    }
}

/// Read-only metadata store for one module.
///
/// # Examples
///
/// ```rust
/// use ilscope::prelude::*;
///
/// let mut tables = MetadataTables::new();
/// let write_line = tables.add_member_ref("WriteLine")?;
/// let greeting = tables.add_user_string("Hello, World!")?;
///
/// assert_eq!(write_line.value(), 0x0A00_0001);
/// assert_eq!(tables.resolve_token(write_line)?.name(), Some("WriteLine"));
/// assert_eq!(tables.user_string(greeting)?, "Hello, World!");
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MetadataTables {
    strings: Vec<u8>,
    user_strings: Vec<u8>,
    blob: Vec<u8>,
    rows: HashMap<TableId, Vec<Row>>,
}

impl Default for MetadataTables {
    fn default() -> Self {
        MetadataTables::new()
    }
}

impl MetadataTables {
    /// Empty tables with empty heaps.
    #[must_use]
    pub fn new() -> Self {
        MetadataTables {
            strings: vec![0],
            user_strings: vec![0],
            blob: vec![0],
            rows: HashMap::new(),
        }
    }

    /// Tables over existing heap data.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if any heap does not start with its empty entry.
    pub fn from_heaps(strings: Vec<u8>, user_strings: Vec<u8>, blob: Vec<u8>) -> Result<Self> {
        Strings::from(&strings)?;
        UserStrings::from(&user_strings)?;
        Blob::from(&blob)?;

        Ok(MetadataTables {
            strings,
            user_strings,
            blob,
            rows: HashMap::new(),
        })
    }

    /// Append a row and return its token.
    ///
    /// Heap indices are not checked here; a dangling index surfaces when the token is
    /// resolved.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the table already holds `0xFF_FFFF` rows, the
    /// most a token can address.
    pub fn push(&mut self, row: Row) -> Result<Token> {
        let table = self.rows.entry(row.table()).or_default();

        // Rows are 1-based
        let token = Token::try_from_parts(row.table(), table.len() as u32 + 1)?;
        table.push(row);
        Ok(token)
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> usize {
        self.rows.get(&table).map_or(0, Vec::len)
    }

    /// Append `value` to `#Strings` and return its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap outgrows 32-bit indices.
    pub fn add_string(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }

        let index = heap_index(&self.strings, "#Strings")?;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        Ok(index)
    }

    /// Append `value` to `#Blob` and return its index.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `value` is too long for a blob length prefix or
    /// the heap outgrows 32-bit indices.
    pub fn add_blob(&mut self, value: &[u8]) -> Result<u32> {
        let index = heap_index(&self.blob, "#Blob")?;
        let Ok(len) = u32::try_from(value.len()) else {
            return Err(malformed_error!("Blob of {} bytes is too long", value.len()));
        };

        write_compressed_uint(len, &mut self.blob)?;
        self.blob.extend_from_slice(value);
        Ok(index)
    }

    /// Append a literal to `#US` and return the `ldstr` token for it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the literal would start beyond the 24-bit offset
    /// an `ldstr` token can carry, or is too long to encode.
    pub fn add_user_string(&mut self, value: &str) -> Result<Token> {
        let units: Vec<u16> = value.encode_utf16().collect();
        let has_special = units
            .iter()
            .any(|&unit| unit >= 0x7F || matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D));

        let index = heap_index(&self.user_strings, "#US")?;
        let token = Token::try_from_parts(TableId::UserString, index)?;
        let Some(len) = u32::try_from(units.len())
            .ok()
            .and_then(|count| count.checked_mul(2))
            .and_then(|bytes| bytes.checked_add(1))
        else {
            return Err(malformed_error!("User string of {} units is too long", units.len()));
        };

        write_compressed_uint(len, &mut self.user_strings)?;
        for unit in units {
            self.user_strings.extend_from_slice(&unit.to_le_bytes());
        }
        self.user_strings.push(u8::from(has_special));

        Ok(token)
    }

    /// Add a `TypeRef` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`].
    pub fn add_type_ref(&mut self, namespace: &str, name: &str) -> Result<Token> {
        let namespace = self.add_string(namespace)?;
        let name = self.add_string(name)?;
        self.push(Row::TypeRef { namespace, name })
    }

    /// Add a `TypeDef` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`].
    pub fn add_type_def(&mut self, namespace: &str, name: &str) -> Result<Token> {
        let namespace = self.add_string(namespace)?;
        let name = self.add_string(name)?;
        self.push(Row::TypeDef { namespace, name })
    }

    /// Add a `Field` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`].
    pub fn add_field(&mut self, name: &str) -> Result<Token> {
        let name = self.add_string(name)?;
        self.push(Row::Field { name })
    }

    /// Add a `MethodDef` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`].
    pub fn add_method_def(&mut self, name: &str) -> Result<Token> {
        let name = self.add_string(name)?;
        self.push(Row::MethodDef { name })
    }

    /// Add a `MemberRef` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`].
    pub fn add_member_ref(&mut self, name: &str) -> Result<Token> {
        let name = self.add_string(name)?;
        self.push(Row::MemberRef { name })
    }

    /// Add a `StandAloneSig` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`] and [`MetadataTables::add_blob`].
    pub fn add_standalone_sig(&mut self, signature: &[u8]) -> Result<Token> {
        let signature = self.add_blob(signature)?;
        self.push(Row::StandAloneSig { signature })
    }

    /// Add a `TypeSpec` row.
    ///
    /// # Errors
    /// See [`MetadataTables::push`] and [`MetadataTables::add_blob`].
    pub fn add_type_spec(&mut self, signature: &[u8]) -> Result<Token> {
        let signature = self.add_blob(signature)?;
        self.push(Row::TypeSpec { signature })
    }

    /// Add a `MethodSpec` row instantiating `method`.
    ///
    /// # Errors
    /// See [`MetadataTables::push`] and [`MetadataTables::add_blob`].
    pub fn add_method_spec(&mut self, method: Token, instantiation: &[u8]) -> Result<Token> {
        let instantiation = self.add_blob(instantiation)?;
        self.push(Row::MethodSpec {
            method,
            instantiation,
        })
    }

    fn row(&self, token: Token, table: TableId) -> Result<&Row> {
        let index = token.row() as usize;
        if index == 0 {
            return Err(TokenNotFound(token));
        }

        self.rows
            .get(&table)
            .and_then(|rows| rows.get(index - 1))
            .ok_or(TokenNotFound(token))
    }

    fn string(&self, index: u32) -> Result<String> {
        Ok(Strings::from(&self.strings)?.get(index as usize)?.to_string())
    }

    fn qualified_name(&self, namespace: u32, name: u32) -> Result<String> {
        let namespace = self.string(namespace)?;
        let name = self.string(name)?;
        if namespace.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{namespace}.{name}"))
        }
    }
}

/// Offset the next entry of `heap` will start at.
fn heap_index(heap: &[u8], name: &str) -> Result<u32> {
    u32::try_from(heap.len()).map_err(|_| malformed_error!("{} heap exceeds 4 GiB", name))
}

impl SymbolTable for MetadataTables {
    fn resolve_token(&self, token: Token) -> Result<Symbol> {
        let Some(table) = token.kind() else {
            return Err(UnsupportedTokenKind(token.table()));
        };

        if table == TableId::UserString {
            let value = self.user_string(token)?;
            return Ok(Symbol::String { token, value });
        }

        let symbol = match *self.row(token, table)? {
            Row::TypeRef { namespace, name } | Row::TypeDef { namespace, name } => Symbol::Type {
                token,
                name: Some(self.qualified_name(namespace, name)?),
            },
            Row::Field { name } => Symbol::Field {
                token,
                name: self.string(name)?,
            },
            Row::MethodDef { name } => Symbol::Method {
                token,
                name: self.string(name)?,
            },
            Row::MemberRef { name } => Symbol::Member {
                token,
                name: self.string(name)?,
            },
            Row::StandAloneSig { signature } => Symbol::Signature {
                token,
                blob: Blob::from(&self.blob)?.get(signature as usize)?.to_vec(),
            },
            Row::TypeSpec { signature } => {
                Blob::from(&self.blob)?.get(signature as usize)?;
                Symbol::Type { token, name: None }
            }
            Row::MethodSpec { method, .. } => {
                if !matches!(method.kind(), Some(TableId::MethodDef | TableId::MemberRef)) {
                    return Err(malformed_error!(
                        "MethodSpec {} instantiates {}, expected a MethodDef or MemberRef",
                        token,
                        method
                    ));
                }

                let generic = self.resolve_token(method)?;
                Symbol::Method {
                    token,
                    name: generic.name().unwrap_or_default().to_string(),
                }
            }
        };

        Ok(symbol)
    }

    fn user_string(&self, token: Token) -> Result<String> {
        if token.kind() != Some(TableId::UserString) {
            return Err(UnsupportedTokenKind(token.table()));
        }

        match UserStrings::from(&self.user_strings)?.get(token.row() as usize) {
            Err(OutOfBounds) => Err(TokenNotFound(token)),
            other => other,
        }
    }
}
