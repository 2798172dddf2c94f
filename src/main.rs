//! CLI front-end: argument parsing, logging initialization, and the
//! assemble-then-write-output flow. Everything PC/symbol-related lives in
//! the library; this file only maps a parsed `Args` onto an
//! [`Assembler`] run and an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::error;

use tlcs900_asm::Assembler;

/// A two-pass assembler for the TLCS-900/H (TMP94C241) CISC processor family.
#[derive(Parser, Debug)]
#[command(name = "tlcs900-asm", version, about)]
struct Args {
    /// Output file; defaults to the input path with its extension replaced by `.rom`.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Raise logging verbosity to debug.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Source file to assemble.
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let output_path = args.output.clone().unwrap_or_else(|| args.input.with_extension("rom"));

    let mut assembler = Assembler::new();
    let bytes = assembler
        .assemble_file(&args.input)
        .map(<[u8]>::to_vec)
        .with_context(|| format!("assembling {}", args.input.display()))?;

    std::fs::write(&output_path, &bytes)
        .with_context(|| format!("writing {}", output_path.display()))?;

    log::info!(
        "wrote {} bytes to {} ({} warning(s))",
        bytes.len(),
        output_path.display(),
        assembler.warning_count()
    );

    Ok(())
}
