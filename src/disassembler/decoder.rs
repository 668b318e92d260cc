//! Sequential CIL instruction decoding.
//!
//! Decoding walks the buffer strictly forward from offset 0. Each step reads the opcode (one
//! byte, or two behind the `0xFE` escape), looks up its operand kind, checks the operand fits
//! in what is left of the buffer and only then reads it. The first failure ends the stream:
//! there is no attempt to resynchronise on a later byte.
//!
//! # Example: Decoding a Single Instruction
//!
//! ```rust
//! use ilscope::{disassembler::{decode_next, SymbolResolver}, Cursor};
//!
//! let code = [0x2A]; // ret
//! let mut cursor = Cursor::new(&code);
//! let instruction = decode_next(&mut cursor, &SymbolResolver::new(None))?.unwrap();
//! assert_eq!(instruction.mnemonic(), "ret");
//! assert_eq!(cursor.pos(), 1);
//! # Ok::<(), ilscope::Error>(())
//! ```
//!
//! # Example: Decoding a Stream of Instructions
//!
//! ```rust
//! use ilscope::decode_all;
//!
//! let code = [0x00, 0x2A]; // nop, ret
//! let instructions = decode_all(&code, None).collect::<ilscope::Result<Vec<_>>>()?;
//! assert_eq!(instructions.len(), 2);
//! assert_eq!(instructions[1].address, 1);
//! # Ok::<(), ilscope::Error>(())
//! ```

use std::iter::FusedIterator;

use crate::{
    disassembler::{
        instruction::{Immediate, Instruction, Operand},
        opcodes::{OpcodeTable, OperandKind, ESCAPE},
        resolver::SymbolResolver,
    },
    file::{cursor::Cursor, io::read_le},
    metadata::{symbols::SymbolTable, token::Token},
    Error::TruncatedStream,
    Result,
};

/// Decode the instruction at the cursor.
///
/// Returns `Ok(None)` once the cursor has reached the end of the buffer. On success the cursor
/// is advanced past the instruction; on failure it is left at the instruction's first byte.
///
/// # Errors
/// Returns [`crate::Error::Decode`] carrying the instruction address and one of
/// [`crate::Error::TruncatedStream`], [`crate::Error::UnknownOpcode`],
/// [`crate::Error::UnsupportedTokenKind`], [`crate::Error::NoMetadata`] or a symbol table error.
pub fn decode_next(
    cursor: &mut Cursor<'_>,
    resolver: &SymbolResolver<'_>,
) -> Result<Option<Instruction>> {
    if !cursor.has_more_data() {
        return Ok(None);
    }

    let Ok(address) = u32::try_from(cursor.pos()) else {
        return Err(malformed_error!(
            "Instruction offset {} exceeds the 32-bit address space",
            cursor.pos()
        ));
    };

    let mut scratch = cursor.clone();
    match decode_instruction(&mut scratch, resolver, address) {
        Ok(instruction) => {
            *cursor = scratch;
            log::trace!("IL_{:04X}: {}", instruction.address, instruction);
            Ok(Some(instruction))
        }
        Err(error) => Err(error.at(address)),
    }
}

fn decode_instruction(
    cursor: &mut Cursor<'_>,
    resolver: &SymbolResolver<'_>,
    address: u32,
) -> Result<Instruction> {
    let start = cursor.pos();

    let first = cursor.read_le::<u8>().map_err(|_| TruncatedStream)?;
    let code = if first == ESCAPE {
        let second = cursor.read_le::<u8>().map_err(|_| TruncatedStream)?;
        u16::from_be_bytes([ESCAPE, second])
    } else {
        u16::from(first)
    };

    let opcode = OpcodeTable::global().lookup(code)?;
    let kind = opcode.operand_kind;
    let bytes = cursor
        .read_bytes(kind.size())
        .map_err(|_| TruncatedStream)?;
    let next = cursor.pos();

    let operand = match kind {
        OperandKind::None => Operand::None,
        OperandKind::BranchTargetShort => {
            Operand::Target(branch_target(next, i64::from(read_le::<i8>(bytes)?))?)
        }
        OperandKind::BranchTargetLong => {
            Operand::Target(branch_target(next, i64::from(read_le::<i32>(bytes)?))?)
        }
        OperandKind::Int8 => Operand::Immediate(Immediate::Int8(read_le(bytes)?)),
        OperandKind::Int32 => Operand::Immediate(Immediate::Int32(read_le(bytes)?)),
        OperandKind::Int64 => Operand::Immediate(Immediate::Int64(read_le(bytes)?)),
        OperandKind::Float32 => Operand::Immediate(Immediate::Float32(read_le(bytes)?)),
        OperandKind::Float64 => Operand::Immediate(Immediate::Float64(read_le(bytes)?)),
        OperandKind::VarIndex8 => Operand::Immediate(Immediate::UInt8(read_le(bytes)?)),
        OperandKind::VarIndex16 => Operand::Immediate(Immediate::UInt16(read_le(bytes)?)),
        OperandKind::SwitchTable => Operand::Immediate(Immediate::UInt32(read_le(bytes)?)),
        OperandKind::FieldRef
        | OperandKind::MethodRef
        | OperandKind::TypeRef
        | OperandKind::SignatureRef
        | OperandKind::StringRef
        | OperandKind::GenericToken => {
            resolver.operand(Token::new(read_le::<u32>(bytes)?), kind)?
        }
    };

    Ok(Instruction {
        address,
        size: (next - start) as u32,
        opcode,
        operand,
    })
}

/// Absolute destination of a branch whose operand ends at `next`.
fn branch_target(next: usize, offset: i64) -> Result<u32> {
    let target = next as i64 + offset;
    u32::try_from(target).map_err(|_| malformed_error!("Branch target {} is out of range", target))
}

/// Lazy iterator over the instructions of one method.
///
/// Yields `Ok` for every instruction in order, then `None` at the end of the buffer. If an
/// instruction cannot be decoded the error is yielded once and the iterator is finished until
/// [`Decoder::reset`] is called.
pub struct Decoder<'a> {
    cursor: Cursor<'a>,
    resolver: SymbolResolver<'a>,
    failed: bool,
}

impl<'a> Decoder<'a> {
    /// Decode `data`, resolving tokens against `table` when one is given.
    #[must_use]
    pub fn new(data: &'a [u8], table: Option<&'a dyn SymbolTable>) -> Self {
        Decoder {
            cursor: Cursor::new(data),
            resolver: SymbolResolver::new(table),
            failed: false,
        }
    }

    /// Start over from the first instruction.
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.failed = false;
    }

    /// Offset of the next instruction to decode.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.cursor.pos()
    }

    /// Returns true once the buffer is exhausted or an error was yielded.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.failed || !self.cursor.has_more_data()
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match decode_next(&mut self.cursor, &self.resolver) {
            Ok(Some(instruction)) => Some(Ok(instruction)),
            Ok(None) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

impl FusedIterator for Decoder<'_> {}

/// Decode a whole buffer lazily.
///
/// Shorthand for [`Decoder::new`].
#[must_use]
pub fn decode_all<'a>(data: &'a [u8], table: Option<&'a dyn SymbolTable>) -> Decoder<'a> {
    Decoder::new(data, table)
}
