use ilscope::disassembler::OpcodeTable;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct OpcodeEntry {
    code: String,
    mnemonic: &'static str,
    operand: &'static str,
    operand_size: usize,
}

#[derive(Debug, Serialize)]
struct OpcodesOutput {
    count: usize,
    opcodes: Vec<OpcodeEntry>,
}

pub fn run(opts: &GlobalOptions) -> anyhow::Result<()> {
    let opcodes: Vec<OpcodeEntry> = OpcodeTable::global()
        .iter()
        .map(|descriptor| OpcodeEntry {
            code: if descriptor.opcode_size() == 2 {
                format!("{:04X}", descriptor.code)
            } else {
                format!("{:02X}", descriptor.code)
            },
            mnemonic: descriptor.mnemonic,
            operand: descriptor.operand_kind.name(),
            operand_size: descriptor.operand_kind.size(),
        })
        .collect();

    let output = OpcodesOutput {
        count: opcodes.len(),
        opcodes,
    };

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(&[
            ("CODE", Align::Right),
            ("MNEMONIC", Align::Left),
            ("OPERAND", Align::Left),
            ("SIZE", Align::Right),
        ]);
        for entry in &out.opcodes {
            tw.row(vec![
                entry.code.clone(),
                entry.mnemonic.to_string(),
                entry.operand.to_string(),
                entry.operand_size.to_string(),
            ]);
        }
        tw.print();
        println!();
        println!("{} opcodes", out.count);
    })
}
