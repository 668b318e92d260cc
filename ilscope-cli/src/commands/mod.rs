pub mod disasm;
pub mod opcodes;

use anyhow::Context;

/// Parse a hex (`0x1a`) or decimal number given on the command line.
pub fn parse_number(value: &str) -> anyhow::Result<usize> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.with_context(|| format!("invalid number: {value}"))
}
