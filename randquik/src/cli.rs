//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::error::CliError;
use crate::units::parse_byte_count;
use randquik_core::Rounds;

/// Write a seeded ChaCha keystream to a file or pipe.
#[derive(Debug, Parser)]
#[command(name = "randquik", version, about)]
pub struct Args {
    /// Worker thread count.
    #[arg(short = 't', long, default_value_t = 8)]
    pub threads: usize,

    /// 32-byte seed as a hex string; short strings are zero-padded on the right.
    #[arg(short = 's', long)]
    pub seed: Option<String>,

    /// ChaCha rounds (8, 12, or 20).
    #[arg(short = 'r', long, default_value_t = 20, value_parser = parse_rounds)]
    pub rounds: u8,

    /// Cap on total bytes written (0 or omitted = unlimited). Accepts unit
    /// suffixes k/kb/ki/kib/m/mb/mi/mib/g/gb/gi/gib/t/tb/ti/tib.
    #[arg(short = 'b', long, value_parser = parse_bytes)]
    pub bytes: Option<u64>,

    /// Output file path, or `-` / omitted for stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

fn parse_rounds(raw: &str) -> Result<u8, String> {
    let count: u8 = raw.parse().map_err(|_| format!("not a number: {raw}"))?;
    match Rounds::from_count(count) {
        Some(_) => Ok(count),
        None => Err(format!("rounds must be one of 8, 12, 20 (got {count})")),
    }
}

fn parse_bytes(raw: &str) -> Result<u64, String> {
    parse_byte_count(raw).ok_or_else(|| format!("invalid byte count: {raw}"))
}

impl Args {
    /// Validates cross-field constraints clap's per-argument parsers can't
    /// express on their own.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.threads == 0 {
            return Err(CliError::BadOption("thread count must be at least 1".into()));
        }
        Ok(())
    }
}
