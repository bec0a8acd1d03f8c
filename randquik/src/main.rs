//! `randquik`: writes a seeded ChaCha keystream to a file or pipe.

mod cli;
mod error;
mod pipeline;
mod seedhex;
mod units;

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use zeroize::Zeroize;

use cli::Args;
use error::CliError;
use randquik_core::{Rounds, KEY_BYTES};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    args.validate()?;

    let refuse_tty = args.output.is_none() && io::stdout().is_terminal();
    if refuse_tty {
        return Err(CliError::RefuseTTY);
    }

    let mut seed = resolve_seed(args.seed.as_deref())?;
    let rounds = Rounds::from_count(args.rounds).expect("validated by clap's value_parser");
    let iv = [0u8; 16];
    // `-b 0` (or an omitted `-b`) means "unlimited" per spec.md §6; only a
    // nonzero cap should ever reach the pipeline as a real limit.
    let max_bytes = args.bytes.filter(|&b| b != 0);

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = Arc::clone(&quit);
        ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
            .map_err(|e| CliError::BadOption(format!("failed to install signal handler: {e}")))?;
    }

    let summary = match args.output.as_deref() {
        Some(path) if path != std::path::Path::new("-") => {
            let file = File::create(path).map_err(|source| CliError::OpenOutput {
                path: path.to_path_buf(),
                source,
            })?;
            pipeline::run(
                &seed,
                &iv,
                rounds,
                args.threads,
                pipeline::DEFAULT_CHUNK_BYTES,
                max_bytes,
                quit,
                io::BufWriter::new(file),
            )?
        }
        _ => {
            let stdout = io::stdout();
            pipeline::run(
                &seed,
                &iv,
                rounds,
                args.threads,
                pipeline::DEFAULT_CHUNK_BYTES,
                max_bytes,
                quit,
                io::BufWriter::new(stdout.lock()),
            )?
        }
    };
    seed.zeroize();

    tracing::info!(bytes_written = summary.bytes_written, "keystream generation complete");
    io::stdout().flush().ok();
    Ok(())
}

fn resolve_seed(arg: Option<&str>) -> Result<[u8; KEY_BYTES], CliError> {
    match arg {
        Some(hex) => Ok(seedhex::decode(hex)?),
        None => {
            let mut seed = [0u8; KEY_BYTES];
            getrandom::fill(&mut seed)?;
            let hex = seedhex::encode(&seed);
            eprintln!("seed: {hex} (reproduce with -s {hex})");
            Ok(seed)
        }
    }
}
