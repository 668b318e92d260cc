use std::{
    fmt::Write as _,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{bail, Context};
use ilscope::{disassembler::render, metadata::method::MethodBody, File};
use serde::Serialize;

use crate::{app::GlobalOptions, commands::parse_number};

/// Options for the `disasm` command.
pub struct DisasmOptions<'a> {
    pub body: bool,
    pub offset: Option<&'a str>,
    pub length: Option<&'a str>,
    pub hex: bool,
    pub bytes: bool,
}

#[derive(Debug, Serialize)]
struct HeaderInfo {
    format: &'static str,
    header_size: usize,
    code_size: usize,
    max_stack: usize,
    init_locals: bool,
    local_var_sig: String,
}

#[derive(Debug, Serialize)]
struct InstructionEntry {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct DisasmOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    header: Option<HeaderInfo>,
    instructions: Vec<InstructionEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Parse hex text such as `72 01 00 00 70` or `7201000070`.
fn parse_hex(text: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(text).context("hex input is not valid text")?;
    let digits: Vec<u8> = text
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        bail!("hex input has an odd number of digits");
    }

    digits
        .chunks_exact(2)
        .map(|pair| match pair {
            [high, low] if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() => {
                Ok((hex_digit(*high) << 4) | hex_digit(*low))
            }
            _ => bail!("invalid hex byte: {:?}", String::from_utf8_lossy(pair)),
        })
        .collect()
}

fn hex_digit(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, byte| {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
        out
    })
}

/// Select the window of the input named by `--offset` and `--length`.
fn select<'a>(data: &'a [u8], opts: &DisasmOptions<'_>) -> anyhow::Result<&'a [u8]> {
    let offset = opts.offset.map(parse_number).transpose()?.unwrap_or(0);
    if offset > data.len() {
        bail!("offset 0x{offset:x} is past the end of the input (0x{:x} bytes)", data.len());
    }

    let available = data.len() - offset;
    let length = match opts.length.map(parse_number).transpose()? {
        Some(length) if length > available => {
            bail!("length 0x{length:x} exceeds the 0x{available:x} bytes after the offset")
        }
        Some(length) => length,
        None => available,
    };

    Ok(&data[offset..offset + length])
}

pub fn run(
    path: &Path,
    opts: &DisasmOptions<'_>,
    cancel: &AtomicBool,
    global: &GlobalOptions,
) -> anyhow::Result<()> {
    let file = File::from_file(path)
        .with_context(|| format!("failed to open: {}", path.display()))?;
    let parsed;
    let data = if opts.hex {
        parsed = parse_hex(file.data())?;
        parsed.as_slice()
    } else {
        file.data()
    };
    let input = select(data, opts)?;

    let (header, code) = if opts.body {
        let body = MethodBody::from(input).context("invalid method body header")?;
        let code = body.code(input).context("method body is truncated")?;
        let header = HeaderInfo {
            format: if body.is_fat { "fat" } else { "tiny" },
            header_size: body.size_header,
            code_size: body.size_code,
            max_stack: body.max_stack,
            init_locals: body.is_init_local,
            local_var_sig: body.local_var_sig_token.to_string(),
        };
        (Some(header), code)
    } else {
        (None, input)
    };

    log::debug!("decoding {} bytes from {}", code.len(), path.display());

    if cancel.load(Ordering::Relaxed) {
        bail!("cancelled");
    }

    let mut instructions = Vec::new();
    let mut error = None;
    for decoded in ilscope::decode_all(code, None) {
        match decoded {
            Ok(instruction) => instructions.push(InstructionEntry {
                address: format!("IL_{:04X}", instruction.address),
                bytes: opts
                    .bytes
                    .then(|| instruction.bytes(code).map(hex_bytes).unwrap_or_default()),
                text: render(&instruction, None),
            }),
            Err(err) => {
                log::warn!("{err}");
                error = Some(err.to_string());
            }
        }
    }

    let output = DisasmOutput {
        header,
        instructions,
        error,
    };

    print_output_text(&output, global)?;

    if let Some(err) = &output.error {
        bail!("{err}");
    }
    Ok(())
}

fn print_output_text(output: &DisasmOutput, global: &GlobalOptions) -> anyhow::Result<()> {
    crate::output::print_output(output, global, |out| {
        if let Some(header) = &out.header {
            println!(
                "// {} header, {} bytes; code size {}; .maxstack {}{}",
                header.format,
                header.header_size,
                header.code_size,
                header.max_stack,
                if header.init_locals { "; .locals init" } else { "" },
            );
            if header.local_var_sig != "0x00000000" {
                println!("// local signature {}", header.local_var_sig);
            }
        }

        let width = out
            .instructions
            .iter()
            .filter_map(|entry| entry.bytes.as_ref().map(String::len))
            .max()
            .unwrap_or(0);
        for entry in &out.instructions {
            match &entry.bytes {
                Some(bytes) => println!("{}: {bytes:<width$}  {}", entry.address, entry.text),
                None => println!("{}: {}", entry.address, entry.text),
            }
        }
    })
}
