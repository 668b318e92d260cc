//! The CIL opcode catalog (ECMA-335 Partition III).
//!
//! Opcodes are keyed by a 16-bit code. Single-byte opcodes keep a zero high byte; opcodes that
//! follow the `0xFE` escape byte are combined as `0xFE00 | second`, so `ceq` (`FE 01`) is
//! `0xFE01` and never collides with `break` (`0x01`).
//!
//! Reserved encodings and the `0xF8..=0xFF` prefix pseudo-opcodes are not part of the catalog
//! and fail lookup with [`crate::Error::UnknownOpcode`].

use std::sync::OnceLock;

use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::{Error::UnknownOpcode, Result};

/// Escape byte introducing a two-byte opcode.
pub const ESCAPE: u8 = 0xFE;

/// What follows an opcode in the instruction stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OperandKind {
    /// No operand
    None,
    /// Signed 8-bit offset relative to the next instruction
    BranchTargetShort,
    /// Signed 32-bit offset relative to the next instruction
    BranchTargetLong,
    /// Signed 8-bit integer
    Int8,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    Float64,
    /// 8-bit argument or local index
    VarIndex8,
    /// 16-bit argument or local index
    VarIndex16,
    /// `Field` or `MemberRef` token
    FieldRef,
    /// `MethodDef`, `MemberRef` or `MethodSpec` token
    MethodRef,
    /// `TypeDef`, `TypeRef` or `TypeSpec` token
    TypeRef,
    /// `StandAloneSig` token
    SignatureRef,
    /// `#US` token
    StringRef,
    /// Any type, field or method token (`ldtoken`)
    GenericToken,
    /// Count of the jump table that follows (`switch`)
    SwitchTable,
}

impl OperandKind {
    /// Width of the operand in bytes.
    ///
    /// `SwitchTable` covers the 4-byte count only; the targets that follow are not part of
    /// the operand.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            OperandKind::None => 0,
            OperandKind::BranchTargetShort | OperandKind::Int8 | OperandKind::VarIndex8 => 1,
            OperandKind::VarIndex16 => 2,
            OperandKind::BranchTargetLong
            | OperandKind::Int32
            | OperandKind::Float32
            | OperandKind::FieldRef
            | OperandKind::MethodRef
            | OperandKind::TypeRef
            | OperandKind::SignatureRef
            | OperandKind::StringRef
            | OperandKind::GenericToken
            | OperandKind::SwitchTable => 4,
            OperandKind::Int64 | OperandKind::Float64 => 8,
        }
    }

    /// Returns true for the two relative branch kinds.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(
            self,
            OperandKind::BranchTargetShort | OperandKind::BranchTargetLong
        )
    }

    /// Returns true for the kinds whose operand is a metadata token.
    #[must_use]
    pub const fn is_token(&self) -> bool {
        matches!(
            self,
            OperandKind::FieldRef
                | OperandKind::MethodRef
                | OperandKind::TypeRef
                | OperandKind::SignatureRef
                | OperandKind::StringRef
                | OperandKind::GenericToken
        )
    }

    /// Snake-case name, e.g. `branch_target_short`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// One entry of the catalog.
#[derive(Debug, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    /// Combined code, `0xFE00 | second` for escaped opcodes
    pub code: u16,
    /// Assembler mnemonic
    pub mnemonic: &'static str,
    /// Operand that follows the opcode
    pub operand_kind: OperandKind,
}

impl OpcodeDescriptor {
    /// Number of bytes the opcode itself occupies (1 or 2).
    #[must_use]
    pub const fn opcode_size(&self) -> usize {
        if self.code > 0xFF {
            2
        } else {
            1
        }
    }
}

const fn op(code: u16, mnemonic: &'static str, operand_kind: OperandKind) -> OpcodeDescriptor {
    OpcodeDescriptor {
        code,
        mnemonic,
        operand_kind,
    }
}

use OperandKind as K;

/// Every defined CIL opcode.
#[rustfmt::skip]
pub static OPCODES: &[OpcodeDescriptor] = &[
    op(0x00, "nop", K::None),
    op(0x01, "break", K::None),
    op(0x02, "ldarg.0", K::None),
    op(0x03, "ldarg.1", K::None),
    op(0x04, "ldarg.2", K::None),
    op(0x05, "ldarg.3", K::None),
    op(0x06, "ldloc.0", K::None),
    op(0x07, "ldloc.1", K::None),
    op(0x08, "ldloc.2", K::None),
    op(0x09, "ldloc.3", K::None),
    op(0x0A, "stloc.0", K::None),
    op(0x0B, "stloc.1", K::None),
    op(0x0C, "stloc.2", K::None),
    op(0x0D, "stloc.3", K::None),
    op(0x0E, "ldarg.s", K::VarIndex8),
    op(0x0F, "ldarga.s", K::VarIndex8),
    op(0x10, "starg.s", K::VarIndex8),
    op(0x11, "ldloc.s", K::VarIndex8),
    op(0x12, "ldloca.s", K::VarIndex8),
    op(0x13, "stloc.s", K::VarIndex8),
    op(0x14, "ldnull", K::None),
    op(0x15, "ldc.i4.m1", K::None),
    op(0x16, "ldc.i4.0", K::None),
    op(0x17, "ldc.i4.1", K::None),
    op(0x18, "ldc.i4.2", K::None),
    op(0x19, "ldc.i4.3", K::None),
    op(0x1A, "ldc.i4.4", K::None),
    op(0x1B, "ldc.i4.5", K::None),
    op(0x1C, "ldc.i4.6", K::None),
    op(0x1D, "ldc.i4.7", K::None),
    op(0x1E, "ldc.i4.8", K::None),
    op(0x1F, "ldc.i4.s", K::Int8),
    op(0x20, "ldc.i4", K::Int32),
    op(0x21, "ldc.i8", K::Int64),
    op(0x22, "ldc.r4", K::Float32),
    op(0x23, "ldc.r8", K::Float64),
    op(0x25, "dup", K::None),
    op(0x26, "pop", K::None),
    op(0x27, "jmp", K::MethodRef),
    op(0x28, "call", K::MethodRef),
    op(0x29, "calli", K::SignatureRef),
    op(0x2A, "ret", K::None),
    op(0x2B, "br.s", K::BranchTargetShort),
    op(0x2C, "brfalse.s", K::BranchTargetShort),
    op(0x2D, "brtrue.s", K::BranchTargetShort),
    op(0x2E, "beq.s", K::BranchTargetShort),
    op(0x2F, "bge.s", K::BranchTargetShort),
    op(0x30, "bgt.s", K::BranchTargetShort),
    op(0x31, "ble.s", K::BranchTargetShort),
    op(0x32, "blt.s", K::BranchTargetShort),
    op(0x33, "bne.un.s", K::BranchTargetShort),
    op(0x34, "bge.un.s", K::BranchTargetShort),
    op(0x35, "bgt.un.s", K::BranchTargetShort),
    op(0x36, "ble.un.s", K::BranchTargetShort),
    op(0x37, "blt.un.s", K::BranchTargetShort),
    op(0x38, "br", K::BranchTargetLong),
    op(0x39, "brfalse", K::BranchTargetLong),
    op(0x3A, "brtrue", K::BranchTargetLong),
    op(0x3B, "beq", K::BranchTargetLong),
    op(0x3C, "bge", K::BranchTargetLong),
    op(0x3D, "bgt", K::BranchTargetLong),
    op(0x3E, "ble", K::BranchTargetLong),
    op(0x3F, "blt", K::BranchTargetLong),
    op(0x40, "bne.un", K::BranchTargetLong),
    op(0x41, "bge.un", K::BranchTargetLong),
    op(0x42, "bgt.un", K::BranchTargetLong),
    op(0x43, "ble.un", K::BranchTargetLong),
    op(0x44, "blt.un", K::BranchTargetLong),
    op(0x45, "switch", K::SwitchTable),
    op(0x46, "ldind.i1", K::None),
    op(0x47, "ldind.u1", K::None),
    op(0x48, "ldind.i2", K::None),
    op(0x49, "ldind.u2", K::None),
    op(0x4A, "ldind.i4", K::None),
    op(0x4B, "ldind.u4", K::None),
    op(0x4C, "ldind.i8", K::None),
    op(0x4D, "ldind.i", K::None),
    op(0x4E, "ldind.r4", K::None),
    op(0x4F, "ldind.r8", K::None),
    op(0x50, "ldind.ref", K::None),
    op(0x51, "stind.ref", K::None),
    op(0x52, "stind.i1", K::None),
    op(0x53, "stind.i2", K::None),
    op(0x54, "stind.i4", K::None),
    op(0x55, "stind.i8", K::None),
    op(0x56, "stind.r4", K::None),
    op(0x57, "stind.r8", K::None),
    op(0x58, "add", K::None),
    op(0x59, "sub", K::None),
    op(0x5A, "mul", K::None),
    op(0x5B, "div", K::None),
    op(0x5C, "div.un", K::None),
    op(0x5D, "rem", K::None),
    op(0x5E, "rem.un", K::None),
    op(0x5F, "and", K::None),
    op(0x60, "or", K::None),
    op(0x61, "xor", K::None),
    op(0x62, "shl", K::None),
    op(0x63, "shr", K::None),
    op(0x64, "shr.un", K::None),
    op(0x65, "neg", K::None),
    op(0x66, "not", K::None),
    op(0x67, "conv.i1", K::None),
    op(0x68, "conv.i2", K::None),
    op(0x69, "conv.i4", K::None),
    op(0x6A, "conv.i8", K::None),
    op(0x6B, "conv.r4", K::None),
    op(0x6C, "conv.r8", K::None),
    op(0x6D, "conv.u4", K::None),
    op(0x6E, "conv.u8", K::None),
    op(0x6F, "callvirt", K::MethodRef),
    op(0x70, "cpobj", K::TypeRef),
    op(0x71, "ldobj", K::TypeRef),
    op(0x72, "ldstr", K::StringRef),
    op(0x73, "newobj", K::MethodRef),
    op(0x74, "castclass", K::TypeRef),
    op(0x75, "isinst", K::TypeRef),
    op(0x76, "conv.r.un", K::None),
    op(0x79, "unbox", K::TypeRef),
    op(0x7A, "throw", K::None),
    op(0x7B, "ldfld", K::FieldRef),
    op(0x7C, "ldflda", K::FieldRef),
    op(0x7D, "stfld", K::FieldRef),
    op(0x7E, "ldsfld", K::FieldRef),
    op(0x7F, "ldsflda", K::FieldRef),
    op(0x80, "stsfld", K::FieldRef),
    op(0x81, "stobj", K::TypeRef),
    op(0x82, "conv.ovf.i1.un", K::None),
    op(0x83, "conv.ovf.i2.un", K::None),
    op(0x84, "conv.ovf.i4.un", K::None),
    op(0x85, "conv.ovf.i8.un", K::None),
    op(0x86, "conv.ovf.u1.un", K::None),
    op(0x87, "conv.ovf.u2.un", K::None),
    op(0x88, "conv.ovf.u4.un", K::None),
    op(0x89, "conv.ovf.u8.un", K::None),
    op(0x8A, "conv.ovf.i.un", K::None),
    op(0x8B, "conv.ovf.u.un", K::None),
    op(0x8C, "box", K::TypeRef),
    op(0x8D, "newarr", K::TypeRef),
    op(0x8E, "ldlen", K::None),
    op(0x8F, "ldelema", K::TypeRef),
    op(0x90, "ldelem.i1", K::None),
    op(0x91, "ldelem.u1", K::None),
    op(0x92, "ldelem.i2", K::None),
    op(0x93, "ldelem.u2", K::None),
    op(0x94, "ldelem.i4", K::None),
    op(0x95, "ldelem.u4", K::None),
    op(0x96, "ldelem.i8", K::None),
    op(0x97, "ldelem.i", K::None),
    op(0x98, "ldelem.r4", K::None),
    op(0x99, "ldelem.r8", K::None),
    op(0x9A, "ldelem.ref", K::None),
    op(0x9B, "stelem.i", K::None),
    op(0x9C, "stelem.i1", K::None),
    op(0x9D, "stelem.i2", K::None),
    op(0x9E, "stelem.i4", K::None),
    op(0x9F, "stelem.i8", K::None),
    op(0xA0, "stelem.r4", K::None),
    op(0xA1, "stelem.r8", K::None),
    op(0xA2, "stelem.ref", K::None),
    op(0xA3, "ldelem", K::TypeRef),
    op(0xA4, "stelem", K::TypeRef),
    op(0xA5, "unbox.any", K::TypeRef),
    op(0xB3, "conv.ovf.i1", K::None),
    op(0xB4, "conv.ovf.u1", K::None),
    op(0xB5, "conv.ovf.i2", K::None),
    op(0xB6, "conv.ovf.u2", K::None),
    op(0xB7, "conv.ovf.i4", K::None),
    op(0xB8, "conv.ovf.u4", K::None),
    op(0xB9, "conv.ovf.i8", K::None),
    op(0xBA, "conv.ovf.u8", K::None),
    op(0xC2, "refanyval", K::TypeRef),
    op(0xC3, "ckfinite", K::None),
    op(0xC6, "mkrefany", K::TypeRef),
    op(0xD0, "ldtoken", K::GenericToken),
    op(0xD1, "conv.u2", K::None),
    op(0xD2, "conv.u1", K::None),
    op(0xD3, "conv.i", K::None),
    op(0xD4, "conv.ovf.i", K::None),
    op(0xD5, "conv.ovf.u", K::None),
    op(0xD6, "add.ovf", K::None),
    op(0xD7, "add.ovf.un", K::None),
    op(0xD8, "mul.ovf", K::None),
    op(0xD9, "mul.ovf.un", K::None),
    op(0xDA, "sub.ovf", K::None),
    op(0xDB, "sub.ovf.un", K::None),
    op(0xDC, "endfinally", K::None),
    op(0xDD, "leave", K::BranchTargetLong),
    op(0xDE, "leave.s", K::BranchTargetShort),
    op(0xDF, "stind.i", K::None),
    op(0xE0, "conv.u", K::None),

    op(0xFE00, "arglist", K::None),
    op(0xFE01, "ceq", K::None),
    op(0xFE02, "cgt", K::None),
    op(0xFE03, "cgt.un", K::None),
    op(0xFE04, "clt", K::None),
    op(0xFE05, "clt.un", K::None),
    op(0xFE06, "ldftn", K::MethodRef),
    op(0xFE07, "ldvirtftn", K::MethodRef),
    op(0xFE09, "ldarg", K::VarIndex16),
    op(0xFE0A, "ldarga", K::VarIndex16),
    op(0xFE0B, "starg", K::VarIndex16),
    op(0xFE0C, "ldloc", K::VarIndex16),
    op(0xFE0D, "ldloca", K::VarIndex16),
    op(0xFE0E, "stloc", K::VarIndex16),
    op(0xFE0F, "localloc", K::None),
    op(0xFE11, "endfilter", K::None),
    op(0xFE12, "unaligned.", K::Int8),
    op(0xFE13, "volatile.", K::None),
    op(0xFE14, "tail.", K::None),
    op(0xFE15, "initobj", K::TypeRef),
    op(0xFE16, "constrained.", K::TypeRef),
    op(0xFE17, "cpblk", K::None),
    op(0xFE18, "initblk", K::None),
    op(0xFE19, "no.", K::Int8),
    op(0xFE1A, "rethrow", K::None),
    op(0xFE1C, "sizeof", K::TypeRef),
    op(0xFE1D, "refanytype", K::None),
    op(0xFE1E, "readonly.", K::None),
];

/// Registry mapping codes to [`OpcodeDescriptor`]s.
///
/// Lookups are two array indexations: one table for single-byte codes and one for codes
/// behind the escape byte.
///
/// # Examples
///
/// ```rust
/// use ilscope::disassembler::OpcodeTable;
///
/// let table = OpcodeTable::global();
/// assert_eq!(table.lookup(0x2A)?.mnemonic, "ret");
/// assert_eq!(table.lookup(0xFE01)?.mnemonic, "ceq");
/// assert!(table.lookup(0x24).is_err());
/// # Ok::<(), ilscope::Error>(())
/// ```
pub struct OpcodeTable {
    single: [Option<&'static OpcodeDescriptor>; 256],
    extended: [Option<&'static OpcodeDescriptor>; 256],
}

impl OpcodeTable {
    /// Build the table from [`OPCODES`].
    ///
    /// # Panics
    /// Panics if the catalog lists a code twice or a code outside the single-byte and
    /// escaped ranges. Both are errors in the catalog itself.
    #[must_use]
    pub fn build() -> Self {
        let mut table = OpcodeTable {
            single: [None; 256],
            extended: [None; 256],
        };

        for descriptor in OPCODES {
            let [high, low] = descriptor.code.to_be_bytes();
            let slot = match high {
                0x00 => &mut table.single[low as usize],
                ESCAPE => &mut table.extended[low as usize],
                _ => panic!("opcode 0x{:04X} has an invalid prefix", descriptor.code),
            };

            assert!(
                slot.is_none(),
                "opcode 0x{:04X} is listed twice",
                descriptor.code
            );
            *slot = Some(descriptor);
        }

        table
    }

    /// The process-wide table, built on first use.
    pub fn global() -> &'static OpcodeTable {
        static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
        TABLE.get_or_init(OpcodeTable::build)
    }

    /// Look up a combined code.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownOpcode`] if no opcode has this code.
    pub fn lookup(&self, code: u16) -> Result<&'static OpcodeDescriptor> {
        let [high, low] = code.to_be_bytes();
        let found = match high {
            0x00 => self.single[low as usize],
            ESCAPE => self.extended[low as usize],
            _ => None,
        };

        found.ok_or(UnknownOpcode(code))
    }

    /// All descriptors in code order.
    pub fn iter(&self) -> impl Iterator<Item = &'static OpcodeDescriptor> + '_ {
        self.single.iter().chain(self.extended.iter()).flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_code_round_trips() {
        let table = OpcodeTable::build();

        for descriptor in OPCODES {
            let found = table.lookup(descriptor.code).unwrap();
            assert_eq!(found.code, descriptor.code);
            assert_eq!(found.mnemonic, descriptor.mnemonic);
        }
        assert_eq!(table.iter().count(), OPCODES.len());
    }

    #[test]
    fn mnemonics_are_unique() {
        let mnemonics: HashSet<_> = OPCODES.iter().map(|d| d.mnemonic).collect();
        assert_eq!(mnemonics.len(), OPCODES.len());
    }

    #[test]
    fn escaped_codes_are_distinct() {
        let table = OpcodeTable::global();

        assert_eq!(table.lookup(0x01).unwrap().mnemonic, "break");
        assert_eq!(table.lookup(0xFE01).unwrap().mnemonic, "ceq");
        assert_eq!(table.lookup(0xFE01).unwrap().opcode_size(), 2);
        assert_eq!(table.lookup(0x01).unwrap().opcode_size(), 1);
    }

    #[test]
    fn unknown_codes() {
        let table = OpcodeTable::global();

        for code in [0x24_u16, 0xA6, 0xE1, 0xFE, 0xFF, 0xFE08, 0xFE1F, 0x01FE, 0xFD00] {
            assert!(
                matches!(table.lookup(code), Err(UnknownOpcode(c)) if c == code),
                "0x{code:04X} should be unknown"
            );
        }
    }

    #[test]
    fn operand_sizes() {
        for kind in OperandKind::iter() {
            assert!([0, 1, 2, 4, 8].contains(&kind.size()), "{kind:?}");
        }
        assert_eq!(OperandKind::COUNT, 17);

        assert_eq!(OperandKind::None.size(), 0);
        assert_eq!(OperandKind::BranchTargetShort.size(), 1);
        assert_eq!(OperandKind::VarIndex16.size(), 2);
        assert_eq!(OperandKind::SwitchTable.size(), 4);
        assert_eq!(OperandKind::Int64.size(), 8);
        assert_eq!(OperandKind::Float64.size(), 8);
    }

    #[test]
    fn operand_kind_names() {
        assert_eq!(OperandKind::BranchTargetShort.name(), "branch_target_short");
        assert_eq!(OperandKind::GenericToken.name(), "generic_token");
    }

    #[test]
    fn kind_groups() {
        let branches = OperandKind::iter().filter(OperandKind::is_branch).count();
        let tokens = OperandKind::iter().filter(OperandKind::is_token).count();
        assert_eq!(branches, 2);
        assert_eq!(tokens, 6);
    }

    #[test]
    fn spot_checks() {
        let table = OpcodeTable::global();

        assert_eq!(table.lookup(0x72).unwrap().operand_kind, OperandKind::StringRef);
        assert_eq!(table.lookup(0x21).unwrap().operand_kind, OperandKind::Int64);
        assert_eq!(table.lookup(0x45).unwrap().operand_kind, OperandKind::SwitchTable);
        assert_eq!(table.lookup(0xD0).unwrap().operand_kind, OperandKind::GenericToken);
        assert_eq!(table.lookup(0xFE0C).unwrap().mnemonic, "ldloc");
        assert_eq!(table.lookup(0xFE0C).unwrap().operand_kind, OperandKind::VarIndex16);
    }
}
