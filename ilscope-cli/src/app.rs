use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ilscope - CIL method body disassembler
#[derive(Debug, Parser)]
#[command(name = "ilscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Disassemble a raw CIL instruction stream or a method body.
    Disasm {
        /// Path to the file holding the code.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Treat the input as a method body with a tiny or fat header.
        #[arg(long)]
        body: bool,

        /// Start reading at this offset (hex like 0x1a or decimal).
        #[arg(long, value_name = "OFFSET")]
        offset: Option<String>,

        /// Read at most this many bytes (hex like 0x1a or decimal).
        #[arg(long, value_name = "LENGTH")]
        length: Option<String>,

        /// Read the file as whitespace-separated hex text instead of binary.
        #[arg(long)]
        hex: bool,

        /// Show the raw bytes of each instruction.
        #[arg(long)]
        bytes: bool,
    },

    /// List the opcode catalog.
    Opcodes,
}
