//! CIL instruction decoding, token resolution and rendering.
//!
//! The pipeline for one method is:
//!
//! 1. [`OpcodeTable`] maps the opcode bytes to an [`OpcodeDescriptor`]
//! 2. [`OperandKind::size`] fixes how many operand bytes follow
//! 3. [`decode_next`] reads and interprets them, asking the [`SymbolResolver`] for tokens
//! 4. [`render`] turns the resulting [`Instruction`] into text
//!
//! [`Decoder`] wraps steps 1 to 3 in an iterator.
//!
//! # Example
//! ```rust
//! use ilscope::disassembler::{decode_all, render};
//!
//! let code = [0x02, 0x03, 0x58, 0x2A]; // ldarg.0; ldarg.1; add; ret
//! let text: Vec<String> = decode_all(&code, None)
//!     .map(|instruction| instruction.map(|i| render(&i, None)))
//!     .collect::<ilscope::Result<_>>()?;
//! assert_eq!(text, ["ldarg.0", "ldarg.1", "add", "ret"]);
//! # Ok::<(), ilscope::Error>(())
//! ```

mod decoder;
mod formatter;
mod instruction;
mod opcodes;
mod resolver;

pub use decoder::{decode_all, decode_next, Decoder};
pub use formatter::render;
pub use instruction::{Immediate, Instruction, Operand};
pub use opcodes::{OpcodeDescriptor, OpcodeTable, OperandKind, ESCAPE, OPCODES};
pub use resolver::{accepted_tables, SymbolResolver};
