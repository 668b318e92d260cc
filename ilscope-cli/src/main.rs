mod app;
mod commands;
mod output;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\nCancelled.");
    })?;

    let cli = Cli::parse();

    // ilscope info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("ilscope", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    let result = match &cli.command {
        Command::Disasm {
            path,
            body,
            offset,
            length,
            hex,
            bytes,
        } => commands::disasm::run(
            path,
            &commands::disasm::DisasmOptions {
                body: *body,
                offset: offset.as_deref(),
                length: length.as_deref(),
                hex: *hex,
                bytes: *bytes,
            },
            &cancel,
            &cli.global,
        ),
        Command::Opcodes => commands::opcodes::run(&cli.global),
    };

    if cancel.load(Ordering::SeqCst) {
        std::process::exit(130);
    }
    result
}
