//! The CLI's error type and its mapping to process exit codes.

use std::path::PathBuf;

use crate::seedhex::SeedFormatError;

/// Everything that can go wrong running the `randquik` binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("seed must be a hex string: {0}")]
    SeedFormat(#[from] SeedFormatError),

    #[error("failed to read OS entropy: {0}")]
    SeedEntropy(#[from] getrandom::Error),

    #[error("failed to open output {path}: {source}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    WriteIO(#[from] std::io::Error),

    #[error("refusing to write binary keystream to a terminal; use -o or redirect stdout")]
    RefuseTTY,

    #[error("{0}")]
    BadOption(String),
}

impl CliError {
    /// The process exit code this error maps to. The spec asks only that
    /// `RefuseTTY` use a distinct code from the other failure modes; this
    /// implementation picks 2 for it and 1 for everything else (see
    /// DESIGN.md for the rationale).
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::RefuseTTY => 2,
            _ => 1,
        }
    }
}
