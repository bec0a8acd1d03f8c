//! Portable scalar backend: one block per call to [`crate::state::block`].
//!
//! This is the universal fallback and also the reference semantics every
//! other backend is validated against (see the module-level tests in
//! `backends/mod.rs`).

use crate::rounds::Rounds;
use crate::state::{block, ChaChaState, BLOCK_BYTES};

/// Width, in blocks, processed per [`generate`] iteration.
pub(crate) const WIDTH: usize = 1;
/// Bytes produced per [`generate`] iteration.
pub(crate) const BATCH_BYTES: usize = WIDTH * BLOCK_BYTES;

/// Fills `out` with as many full 64-byte blocks as fit, advancing the
/// counter by one block per 64 bytes written. Returns the number of bytes
/// written (a multiple of 64).
pub(crate) fn generate(state: &mut ChaChaState, rounds: Rounds, out: &mut [u8]) -> usize {
    let mut written = 0;
    for chunk in out.chunks_exact_mut(BLOCK_BYTES) {
        let buf: &mut [u8; BLOCK_BYTES] = chunk.try_into().expect("64-byte chunk");
        block(state, rounds, buf);
        written += BLOCK_BYTES;
    }
    written
}
