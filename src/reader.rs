//! End-to-end disassembly of methods.
//!
//! A module loader exposes its methods through [`MethodSource`]: the raw IL of the body and the
//! module's [`SymbolTable`]. [`read_method`] decodes and renders one method; [`read_methods`]
//! fans a batch out over the rayon thread pool.
//!
//! # Examples
//!
//! ```rust
//! use ilscope::prelude::*;
//!
//! let mut tables = MetadataTables::new();
//! let write_line = tables.add_member_ref("WriteLine")?;
//! let hello = tables.add_user_string("hello")?;
//!
//! let mut code = vec![0x72];
//! code.extend_from_slice(&hello.value().to_le_bytes());
//! code.push(0x28);
//! code.extend_from_slice(&write_line.value().to_le_bytes());
//! code.push(0x2A);
//!
//! let lines = read_method(&MethodRef::new("Main", &code, Some(&tables)))?;
//! let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
//! assert_eq!(text, [
//!     "IL_0000: ldstr \"hello\"",
//!     "IL_0005: call \"WriteLine\"",
//!     "IL_000A: ret",
//! ]);
//! # Ok::<(), ilscope::Error>(())
//! ```

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use rayon::prelude::*;

use crate::{
    disassembler::{decode_all, render},
    metadata::symbols::SymbolTable,
    Error::{Cancelled, NoBody, NoMetadata},
    Result,
};

/// A method as handed out by a module loader.
pub trait MethodSource: Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// The IL code of the body, or `None` for abstract, extern and runtime-implemented methods.
    fn il_code(&self) -> Option<&[u8]>;

    /// The symbol table of the owning module, if its metadata is available.
    fn symbol_table(&self) -> Option<&dyn SymbolTable>;
}

/// A [`MethodSource`] over borrowed parts.
#[derive(Clone, Copy)]
pub struct MethodRef<'a> {
    name: &'a str,
    code: Option<&'a [u8]>,
    table: Option<&'a dyn SymbolTable>,
}

impl<'a> MethodRef<'a> {
    /// A method with a body.
    #[must_use]
    pub fn new(name: &'a str, code: &'a [u8], table: Option<&'a dyn SymbolTable>) -> Self {
        MethodRef {
            name,
            code: Some(code),
            table,
        }
    }

    /// A method without a body.
    #[must_use]
    pub fn bodiless(name: &'a str, table: Option<&'a dyn SymbolTable>) -> Self {
        MethodRef {
            name,
            code: None,
            table,
        }
    }
}

impl MethodSource for MethodRef<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn il_code(&self) -> Option<&[u8]> {
        self.code
    }

    fn symbol_table(&self) -> Option<&dyn SymbolTable> {
        self.table
    }
}

/// One line of disassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Offset of the instruction within the method
    pub address: u32,
    /// Rendered instruction
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04X}: {}", self.address, self.text)
    }
}

/// Decode and render every instruction of `code`.
///
/// Unlike [`read_method`] this does not insist on a symbol table; tokens are shown raw when
/// `table` is `None`.
///
/// # Errors
/// Returns the first decoding error, see [`crate::disassembler::decode_next`].
pub fn disassemble(code: &[u8], table: Option<&dyn SymbolTable>) -> Result<Vec<Line>> {
    decode_all(code, table)
        .map(|instruction| {
            instruction.map(|instruction| Line {
                address: instruction.address,
                text: render(&instruction, table),
            })
        })
        .collect()
}

/// Disassemble one method.
///
/// # Errors
/// Returns [`crate::Error::NoBody`] if the method has no IL, [`crate::Error::NoMetadata`] if
/// its module has no symbol table, or the first decoding error.
pub fn read_method(method: &dyn MethodSource) -> Result<Vec<Line>> {
    let Some(code) = method.il_code() else {
        return Err(NoBody);
    };
    let Some(table) = method.symbol_table() else {
        return Err(NoMetadata);
    };

    log::debug!("disassembling {} ({} bytes)", method.name(), code.len());
    disassemble(code, Some(table))
}

/// Disassemble many methods in parallel.
///
/// Results are in input order; one method failing does not affect the others.
pub fn read_methods<M: MethodSource>(methods: &[M]) -> Vec<Result<Vec<Line>>> {
    read_methods_cancellable(methods, &AtomicBool::new(false))
}

/// [`read_methods`] with cooperative cancellation.
///
/// `cancel` is checked before each method starts; methods not yet started when it is set
/// yield [`crate::Error::Cancelled`]. A method that has started always runs to completion.
pub fn read_methods_cancellable<M: MethodSource>(
    methods: &[M],
    cancel: &AtomicBool,
) -> Vec<Result<Vec<Line>>> {
    methods
        .par_iter()
        .map(|method| {
            if cancel.load(Ordering::Relaxed) {
                return Err(Cancelled);
            }

            let result = read_method(method);
            if let Err(error) = &result {
                log::warn!("failed to disassemble {}: {}", method.name(), error);
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::tables::MetadataTables, Error};

    #[test]
    fn read_method_requires_body() {
        let tables = MetadataTables::new();
        let method = MethodRef::bodiless("Abstract", Some(&tables));

        assert!(matches!(read_method(&method), Err(NoBody)));
    }

    #[test]
    fn read_method_requires_metadata() {
        let method = MethodRef::new("Orphan", &[0x2A], None);

        assert!(matches!(read_method(&method), Err(NoMetadata)));
    }

    #[test]
    fn read_method_lines() {
        let tables = MetadataTables::new();
        let method = MethodRef::new("Answer", &[0x1F, 0x2A, 0x2A], Some(&tables));

        let lines = read_method(&method).unwrap();
        assert_eq!(
            lines,
            vec![
                Line {
                    address: 0,
                    text: "ldc.i4.s 42".to_string()
                },
                Line {
                    address: 2,
                    text: "ret".to_string()
                },
            ]
        );
        assert_eq!(lines[1].to_string(), "IL_0002: ret");
    }

    #[test]
    fn line_address_matches_target_case() {
        let mut code = vec![0x00; 0x1A];
        code.extend_from_slice(&[0x2B, 0xFE]);

        let lines = disassemble(&code, None).unwrap();
        assert_eq!(lines[0x1A].to_string(), "IL_001A: br.s 001A");
    }

    #[test]
    fn read_method_error_carries_offset() {
        let tables = MetadataTables::new();
        let method = MethodRef::new("Broken", &[0x00, 0x00, 0x28, 0x01], Some(&tables));

        let err = read_method(&method).unwrap_err();
        assert_eq!(err.offset(), Some(2));
        assert!(matches!(err.cause(), Error::TruncatedStream));
    }

    #[test]
    fn disassemble_without_table() {
        let lines = disassemble(&[0x28, 0x01, 0x00, 0x00, 0x0A, 0x2A], None).unwrap();
        assert_eq!(lines[0].text, "call 0x0a000001");
        assert_eq!(lines[1].address, 5);
    }

    #[test]
    fn read_methods_keeps_order() {
        let tables = MetadataTables::new();
        let bodies: Vec<Vec<u8>> = (0..64_u8)
            .map(|i| if i == 7 { vec![0x24] } else { vec![0x1F, i, 0x2A] })
            .collect();
        let methods: Vec<_> = bodies
            .iter()
            .map(|code| MethodRef::new("m", code, Some(&tables)))
            .collect();

        let results = read_methods(&methods);

        assert_eq!(results.len(), 64);
        for (i, result) in results.iter().enumerate() {
            if i == 7 {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap()[0].text, format!("ldc.i4.s {i}"));
            }
        }
    }

    #[test]
    fn read_methods_cancelled() {
        let tables = MetadataTables::new();
        let methods = vec![MethodRef::new("m", &[0x2A], Some(&tables)); 8];
        let cancel = AtomicBool::new(true);

        let results = read_methods_cancellable(&methods, &cancel);
        assert!(results.iter().all(|r| matches!(r, Err(Cancelled))));
    }
}
