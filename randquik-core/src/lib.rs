//! ChaCha keystream engine: scalar and SIMD-vectorized block functions, a
//! seekable streaming byte generator, and a bit-generator adapter for
//! numerical code.
//!
//! This crate has no opinion on where key material comes from — seed
//! parsing, entropy collection, and CLI plumbing live in the `randquik`
//! binary crate built on top of it.

#![cfg_attr(not(test), no_std)]

mod backends;
mod bitgen;
mod rounds;
mod state;
mod stream;

pub use bitgen::BitGenerator;
pub use rounds::Rounds;
pub use state::{block, ChaChaState, BLOCK_BYTES, IV_BYTES, KEY_BYTES, STATE_WORDS};
pub use stream::StreamCipher;
