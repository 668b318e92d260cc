// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # ilscope
//!
//! A small, strict decoder and disassembler for ECMA-335 CIL instruction streams.
//!
//! `ilscope` turns the raw bytes of a method body into a sequence of addressed instructions,
//! resolving the metadata tokens embedded in operands against a module's symbol table. It is
//! built for untrusted input: every read is bounds-checked, decoding stops at the first
//! malformed instruction, and errors carry the offset at which they occurred.
//!
//! ## Features
//!
//! - **Complete opcode catalog** - every defined single-byte and `0xFE`-escaped CIL opcode
//! - **Exact operand decoding** - fixed operand widths, little-endian immediates, relative branch targets
//! - **Token resolution** - field, method, type, signature and user-string tokens resolved to [`Symbol`]s
//! - **Readable output** - `ldstr "hello"`, `br.s 0010`, `call "WriteLine"`
//! - **Batch decoding** - many methods in parallel with cooperative cancellation
//!
//! ## Quick Start
//!
//! ```rust
//! use ilscope::prelude::*;
//!
//! // ldc.i4.0; ret
//! let code = [0x16, 0x2A];
//! for instruction in decode_all(&code, None) {
//!     let instruction = instruction?;
//!     println!("IL_{:04X}: {}", instruction.address, instruction);
//! }
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! ### Resolving symbols
//!
//! ```rust
//! use ilscope::prelude::*;
//!
//! let mut tables = MetadataTables::new();
//! let hello = tables.add_user_string("hello")?;
//!
//! let token = hello.value().to_le_bytes();
//! let code = [0x72, token[0], token[1], token[2], token[3], 0x2A];
//!
//! let method = MethodRef::new("Main", &code, Some(&tables));
//! let lines = read_method(&method)?;
//! assert_eq!(lines[0].text, "ldstr \"hello\"");
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Failures while decoding an instruction are
//! wrapped in [`Error::Decode`], which records the address of the offending instruction;
//! [`Error::cause`] returns the underlying failure.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use ilscope::prelude::*;
///
/// let instructions: Vec<Instruction> = decode_all(&[0x00, 0x2A], None)
///     .collect::<ilscope::Result<_>>()?;
/// assert_eq!(instructions.len(), 2);
/// # Ok::<(), ilscope::Error>(())
/// ```
pub mod prelude;

/// CIL instruction decoding, token resolution and rendering.
///
/// # Key Types
///
/// - [`disassembler::OpcodeTable`] - The static registry of opcode descriptors
/// - [`disassembler::Decoder`] - Lazy, restartable iterator over a method's instructions
/// - [`disassembler::Instruction`] - One decoded instruction
/// - [`disassembler::SymbolResolver`] - Turns metadata tokens into [`Symbol`]s
///
/// # Main Functions
///
/// - [`disassembler::decode_next`] - Decode a single instruction at the cursor
/// - [`disassembler::decode_all`] - Decode a whole buffer lazily
/// - [`disassembler::render`] - Render an instruction to text
pub mod disassembler;

/// Byte-level input: bounds-checked readers, the decoding cursor and file backends.
pub mod file;

/// Metadata tokens, heaps, symbols and method body headers.
///
/// The decoder never reads metadata directly; it goes through the [`SymbolTable`] trait.
/// [`metadata::tables::MetadataTables`] is the bundled implementation, backed by the
/// `#Strings`, `#US` and `#Blob` heap views in [`metadata::streams`].
pub mod metadata;

/// End-to-end disassembly of methods supplied by a module loader.
pub mod reader;

/// `ilscope` Result type
pub type Result<T> = std::result::Result<T, Error>;

/// `ilscope` Error type
pub use error::Error;

pub use disassembler::{decode_all, Decoder, Instruction, Operand};
pub use file::{cursor::Cursor, File};
pub use metadata::{
    symbols::{Symbol, SymbolTable},
    token::Token,
};
pub use reader::{read_method, read_methods, Line, MethodRef, MethodSource};
