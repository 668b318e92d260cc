use std::fmt::{self, UpperHex};

use crate::{
    disassembler::opcodes::{OpcodeDescriptor, OperandKind},
    metadata::{symbols::Symbol, token::Token},
};

/// A literal operand value, kept at the width it was encoded with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit value (`ldc.i4.s`, `unaligned.`, `no.`)
    Int8(i8),
    /// 8-bit argument or local index
    UInt8(u8),
    /// 16-bit argument or local index
    UInt16(u16),
    /// Signed 32-bit value (`ldc.i4`)
    Int32(i32),
    /// Unsigned 32-bit value (`switch` count)
    UInt32(u32),
    /// Signed 64-bit value (`ldc.i8`)
    Int64(i64),
    /// 32-bit float (`ldc.r4`)
    Float32(f32),
    /// 64-bit float (`ldc.r8`)
    Float64(f64),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value}"),
            Immediate::UInt8(value) => write!(f, "{value}"),
            Immediate::UInt16(value) => write!(f, "{value}"),
            Immediate::Int32(value) => write!(f, "{value}"),
            Immediate::UInt32(value) => write!(f, "{value}"),
            Immediate::Int64(value) => write!(f, "{value}"),
            Immediate::Float32(value) => write!(f, "{value:?}"),
            Immediate::Float64(value) => write!(f, "{value:?}"),
        }
    }
}

impl UpperHex for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Int8(value) => write!(f, "{value:02X}"),
            Immediate::UInt8(value) => write!(f, "{value:02X}"),
            Immediate::UInt16(value) => write!(f, "{value:04X}"),
            Immediate::Int32(value) => write!(f, "{value:08X}"),
            Immediate::UInt32(value) => write!(f, "{value:08X}"),
            Immediate::Int64(value) => write!(f, "{value:016X}"),
            Immediate::Float32(value) => write!(f, "{:08X}", value.to_bits()),
            Immediate::Float64(value) => write!(f, "{:016X}", value.to_bits()),
        }
    }
}

/// The decoded operand of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The opcode takes no operand
    None,
    /// A literal, slot index or switch count
    Immediate(Immediate),
    /// Absolute address of a branch destination
    Target(u32),
    /// A token resolved against the symbol table
    Symbol(Symbol),
    /// A token left unresolved because no symbol table was available
    Token(Token),
}

impl Operand {
    /// The token behind this operand, resolved or not.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            Operand::Symbol(symbol) => Some(symbol.token()),
            Operand::Token(token) => Some(*token),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Immediate(immediate) => write!(f, "{immediate}"),
            Operand::Target(target) => write!(f, "{target:04X}"),
            Operand::Symbol(symbol) => write!(f, "{symbol}"),
            Operand::Token(token) => write!(f, "{token}"),
        }
    }
}

/// One decoded instruction.
///
/// Instructions own their operand, so they outlive both the buffer and the symbol table they
/// were decoded from.
///
/// # Examples
///
/// ```rust
/// use ilscope::{decode_all, Operand};
///
/// // br.s -2 (a branch to itself)
/// let instruction = decode_all(&[0x2B, 0xFE], None).next().unwrap()?;
/// assert_eq!(instruction.mnemonic(), "br.s");
/// assert_eq!(instruction.size, 2);
/// assert_eq!(instruction.operand, Operand::Target(0));
/// assert_eq!(instruction.to_string(), "br.s 0000");
/// # Ok::<(), ilscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Offset of the first opcode byte within the method
    pub address: u32,
    /// Opcode and operand bytes
    pub size: u32,
    /// The catalog entry for this opcode
    pub opcode: &'static OpcodeDescriptor,
    /// The decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// Assembler mnemonic.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic
    }

    /// Combined opcode value.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.opcode.code
    }

    /// Operand kind from the catalog.
    #[must_use]
    pub fn operand_kind(&self) -> OperandKind {
        self.opcode.operand_kind
    }

    /// Address of the following instruction.
    #[must_use]
    pub fn next_address(&self) -> u32 {
        self.address.saturating_add(self.size)
    }

    /// The bytes this instruction was decoded from, given the method's code.
    #[must_use]
    pub fn bytes<'a>(&self, code: &'a [u8]) -> Option<&'a [u8]> {
        code.get(self.address as usize..self.next_address() as usize)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::disassembler::render(self, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassembler::opcodes::OpcodeTable;

    fn instruction(code: u16, operand: Operand) -> Instruction {
        let opcode = OpcodeTable::global().lookup(code).unwrap();
        Instruction {
            address: 0x10,
            size: (opcode.opcode_size() + opcode.operand_kind.size()) as u32,
            opcode,
            operand,
        }
    }

    #[test]
    fn immediate_display() {
        assert_eq!(Immediate::Int8(-3).to_string(), "-3");
        assert_eq!(Immediate::Int64(i64::MIN).to_string(), "-9223372036854775808");
        assert_eq!(Immediate::Float32(1.0).to_string(), "1.0");
        assert_eq!(Immediate::Float64(0.5).to_string(), "0.5");
        assert_eq!(Immediate::UInt16(300).to_string(), "300");
    }

    #[test]
    fn immediate_hex() {
        assert_eq!(format!("{:X}", Immediate::Int8(-1)), "FF");
        assert_eq!(format!("{:X}", Immediate::UInt32(3)), "00000003");
        assert_eq!(format!("{:X}", Immediate::Float32(1.0)), "3F800000");
    }

    #[test]
    fn operand_display() {
        assert_eq!(Operand::None.to_string(), "");
        assert_eq!(Operand::Target(0x1F).to_string(), "001F");
        assert_eq!(Operand::Target(0x12345).to_string(), "12345");
        assert_eq!(Operand::Token(Token(0x0A00_0001)).to_string(), "0x0a000001");
    }

    #[test]
    fn operand_token() {
        let symbol = Symbol::Field {
            token: Token(0x0400_0001),
            name: "x".to_string(),
        };
        assert_eq!(Operand::Symbol(symbol).token(), Some(Token(0x0400_0001)));
        assert_eq!(Operand::Token(Token(0x0200_0001)).token(), Some(Token(0x0200_0001)));
        assert_eq!(Operand::Target(4).token(), None);
    }

    #[test]
    fn instruction_accessors() {
        let ceq = instruction(0xFE01, Operand::None);
        assert_eq!(ceq.mnemonic(), "ceq");
        assert_eq!(ceq.code(), 0xFE01);
        assert_eq!(ceq.size, 2);
        assert_eq!(ceq.next_address(), 0x12);
        assert_eq!(ceq.operand_kind(), OperandKind::None);
        assert_eq!(ceq.to_string(), "ceq");

        let ldc = instruction(0x20, Operand::Immediate(Immediate::Int32(7)));
        assert_eq!(ldc.size, 5);
        assert_eq!(ldc.to_string(), "ldc.i4 7");

        let mut code = vec![0_u8; 0x10];
        code.extend_from_slice(&[0x20, 0x07, 0x00, 0x00, 0x00]);
        assert_eq!(ldc.bytes(&code), Some(&code[0x10..]));
        assert_eq!(ldc.bytes(&code[..0x12]), None);
    }
}
