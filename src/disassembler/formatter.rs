//! Text rendering of decoded instructions.
//!
//! Rendering picks the first form that applies:
//!
//! | operand                     | output                |
//! |-----------------------------|-----------------------|
//! | branch target               | `br.s 001A`           |
//! | string literal              | `ldstr "hello"`       |
//! | named symbol                | `call "WriteLine"`    |
//! | anything else               | `ldc.i4 42`, `ret`    |
//!
//! The literal and symbol forms need a symbol table. Without one, a resolved operand falls back
//! to its raw token.

use crate::{
    disassembler::instruction::{Instruction, Operand},
    metadata::symbols::SymbolTable,
};

/// Render one instruction.
///
/// # Examples
///
/// ```rust
/// use ilscope::{decode_all, disassembler::render};
///
/// let instruction = decode_all(&[0x1F, 0x2A], None).next().unwrap()?;
/// assert_eq!(render(&instruction, None), "ldc.i4.s 42");
/// # Ok::<(), ilscope::Error>(())
/// ```
#[must_use]
pub fn render(instruction: &Instruction, table: Option<&dyn SymbolTable>) -> String {
    let mnemonic = instruction.mnemonic();

    match (&instruction.operand, table) {
        (Operand::Target(target), _) => format!("{mnemonic} {target:04X}"),
        (Operand::Symbol(symbol), Some(_)) => match (symbol.as_str(), symbol.name()) {
            (Some(text), _) => format!("{mnemonic} \"{text}\""),
            (None, Some(name)) => format!("{mnemonic} \"{name}\""),
            (None, None) => default_form(mnemonic, &instruction.operand),
        },
        (operand, _) => default_form(mnemonic, operand),
    }
}

fn default_form(mnemonic: &str, operand: &Operand) -> String {
    match operand {
        Operand::None => mnemonic.to_string(),
        other => format!("{mnemonic} {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decode_all,
        metadata::{tables::MetadataTables, token::Token},
        test::{CodeBuilder, SampleModule},
    };

    fn first(code: &[u8], table: Option<&dyn SymbolTable>) -> Instruction {
        decode_all(code, table).next().unwrap().unwrap()
    }

    #[test]
    fn render_branch() {
        let instruction = first(&[0x2B, 0x10], None);
        assert_eq!(render(&instruction, None), "br.s 0012");

        let tables = MetadataTables::new();
        assert_eq!(render(&instruction, Some(&tables)), "br.s 0012");
    }

    #[test]
    fn render_plain() {
        assert_eq!(render(&first(&[0x2A], None), None), "ret");
        assert_eq!(render(&first(&[0x15], None), None), "ldc.i4.m1");
        assert_eq!(
            render(&first(&[0x20, 0xFF, 0xFF, 0xFF, 0xFF], None), None),
            "ldc.i4 -1"
        );
        assert_eq!(render(&first(&[0x0E, 0x03], None), None), "ldarg.s 3");
    }

    #[test]
    fn render_string_literal() {
        let module = SampleModule::new();
        let code = CodeBuilder::new().token(0x72, module.hello).build();

        let instruction = first(&code, Some(&module.tables));
        assert_eq!(render(&instruction, Some(&module.tables)), "ldstr \"hello\"");
    }

    #[test]
    fn render_named_symbols() {
        let module = SampleModule::new();
        let table: Option<&dyn SymbolTable> = Some(&module.tables);

        let call = CodeBuilder::new().token(0x28, module.main).build();
        let ldsfld = CodeBuilder::new().token(0x7E, module.count).build();
        let ldtoken = CodeBuilder::new().token(0xD0, module.program).build();

        assert_eq!(render(&first(&call, table), table), "call \"Main\"");
        assert_eq!(render(&first(&ldsfld, table), table), "ldsfld \"count\"");
        assert_eq!(
            render(&first(&ldtoken, table), table),
            "ldtoken \"Demo.Program\""
        );
    }

    #[test]
    fn render_symbol_without_table() {
        let module = SampleModule::new();
        let code = CodeBuilder::new().token(0x6F, module.write_line).build();

        // decoded with metadata, rendered without it
        let instruction = first(&code, Some(&module.tables));
        assert_eq!(render(&instruction, None), "callvirt 0x0a000001");
        assert_eq!(instruction.to_string(), "callvirt 0x0a000001");
        assert_eq!(
            render(&instruction, Some(&module.tables)),
            "callvirt \"WriteLine\""
        );

        let literal = first(
            &CodeBuilder::new().token(0x72, module.hello).build(),
            Some(&module.tables),
        );
        assert_eq!(render(&literal, None), "ldstr 0x70000001");
    }

    #[test]
    fn render_unnamed_symbol() {
        let mut tables = MetadataTables::new();
        let sig = tables.add_standalone_sig(&[0x00, 0x00, 0x01]).unwrap();
        let mut code = vec![0x29];
        code.extend_from_slice(&sig.value().to_le_bytes());

        let instruction = first(&code, Some(&tables));
        assert_eq!(render(&instruction, Some(&tables)), "calli 0x11000001");
    }

    #[test]
    fn render_without_table() {
        let code = [0x72, 0x01, 0x00, 0x00, 0x70];
        let instruction = first(&code, None);

        assert_eq!(instruction.operand, Operand::Token(Token(0x7000_0001)));
        assert_eq!(render(&instruction, None), "ldstr 0x70000001");
    }
}
