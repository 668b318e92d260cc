//! # ilscope Prelude
//!
//! The types needed to decode and render method bodies, for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ilscope operations
pub use crate::Error;

/// The result type used throughout ilscope
pub use crate::Result;

// ================================================================================================
// Decoding
// ================================================================================================

pub use crate::disassembler::{
    decode_all, decode_next, render, Decoder, Immediate, Instruction, OpcodeDescriptor,
    OpcodeTable, Operand, OperandKind, SymbolResolver,
};

/// Input handling
pub use crate::file::{cursor::Cursor, File};

// ================================================================================================
// Metadata
// ================================================================================================

pub use crate::metadata::{
    method::MethodBody,
    symbols::{Symbol, SymbolTable},
    tableid::TableId,
    tables::MetadataTables,
    token::Token,
};

// ================================================================================================
// Method Disassembly
// ================================================================================================

pub use crate::reader::{
    disassemble, read_method, read_methods, read_methods_cancellable, Line, MethodRef,
    MethodSource,
};
