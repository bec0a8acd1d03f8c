//! The 16-word ChaCha state and the scalar block function.
//!
//! This is the normative reference: every vectorized backend must produce
//! output bit-for-bit identical to repeated calls of [`block`].

use crate::rounds::Rounds;

/// "expand 32-byte k", as four little-endian 32-bit words.
pub(crate) const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// Number of 32-bit words in a ChaCha state.
pub const STATE_WORDS: usize = 16;
/// Number of bytes in one ChaCha keystream block.
pub const BLOCK_BYTES: usize = 64;
/// Key length in bytes (256-bit keys only, per the spec's non-goals).
pub const KEY_BYTES: usize = 32;
/// IV length in bytes: 8 bytes of initial counter followed by 8 bytes of nonce.
pub const IV_BYTES: usize = 16;

/// The 16-word ChaCha matrix: constants, key, 64-bit counter, 64-bit nonce.
///
/// ```text
/// constant  constant  constant  constant
/// key       key       key       key
/// key       key       key       key
/// counter   counter   nonce     nonce
/// ```
#[derive(Clone)]
#[repr(transparent)]
pub struct ChaChaState {
    pub(crate) words: [u32; STATE_WORDS],
}

impl ChaChaState {
    /// Builds a fresh state from a 256-bit key and a 128-bit IV (initial
    /// counter followed by nonce), both little-endian.
    pub fn new(key: &[u8; KEY_BYTES], iv: &[u8; IV_BYTES]) -> Self {
        let mut words = [0u32; STATE_WORDS];
        words[0..4].copy_from_slice(&CONSTANTS);
        for (word, chunk) in words[4..12].iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        }
        for (word, chunk) in words[12..16].iter_mut().zip(iv.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        }
        Self { words }
    }

    /// Current 64-bit block counter (words 12..13, little-endian pair).
    #[inline]
    pub fn counter(&self) -> u64 {
        u64::from(self.words[12]) | (u64::from(self.words[13]) << 32)
    }

    /// Overwrites the 64-bit block counter in place.
    #[inline]
    pub fn set_counter(&mut self, value: u64) {
        self.words[12] = value as u32;
        self.words[13] = (value >> 32) as u32;
    }

    /// Adds a signed block delta to the counter, wrapping modulo 2^64.
    #[inline]
    pub fn seek(&mut self, delta: i64) {
        let cur = self.counter();
        let next = cur.wrapping_add(delta as u64);
        self.set_counter(next);
    }

    /// Advances the counter by exactly `blocks`, wrapping modulo 2^64.
    #[inline]
    pub(crate) fn advance(&mut self, blocks: u64) {
        let next = self.counter().wrapping_add(blocks);
        self.set_counter(next);
    }

    /// Zeroes every word, including key and nonce material.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.words = [0u32; STATE_WORDS];
    }
}

/// One ChaCha quarter-round: `a += b; d ^= a; d <<<= 16; c += d; b ^= c; b <<<= 12;
/// a += b; d ^= a; d <<<= 8; c += d; b ^= c; b <<<= 7`.
#[inline(always)]
pub(crate) fn quarter_round(state: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// Runs `rounds` double-rounds over a copy of `state`, then adds the
/// original state back in. Does not touch the counter; callers advance it.
#[inline(always)]
pub(crate) fn permute(state: &[u32; STATE_WORDS], rounds: Rounds) -> [u32; STATE_WORDS] {
    let mut x = *state;
    for _ in 0..rounds.double_rounds() {
        // column round
        quarter_round(&mut x, 0, 4, 8, 12);
        quarter_round(&mut x, 1, 5, 9, 13);
        quarter_round(&mut x, 2, 6, 10, 14);
        quarter_round(&mut x, 3, 7, 11, 15);
        // diagonal round
        quarter_round(&mut x, 0, 5, 10, 15);
        quarter_round(&mut x, 1, 6, 11, 12);
        quarter_round(&mut x, 2, 7, 8, 13);
        quarter_round(&mut x, 3, 4, 9, 14);
    }
    for (out, orig) in x.iter_mut().zip(state.iter()) {
        *out = out.wrapping_add(*orig);
    }
    x
}

/// Computes one 64-byte keystream block from `state` and advances its
/// counter by one. This is the reference the vectorized backends must
/// agree with, bit-for-bit.
pub fn block(state: &mut ChaChaState, rounds: Rounds, out: &mut [u8; BLOCK_BYTES]) {
    let result = permute(&state.words, rounds);
    for (chunk, word) in out.chunks_exact_mut(4).zip(result.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    state.advance(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc7539_first_block() {
        let key = [0u8; KEY_BYTES];
        let iv = [0u8; IV_BYTES];
        let mut state = ChaChaState::new(&key, &iv);
        let mut buf = [0u8; BLOCK_BYTES];
        block(&mut state, Rounds::R20, &mut buf);
        assert_eq!(buf[0..8], [0x76, 0xb8, 0xe0, 0xad, 0xa0, 0xf1, 0x3d, 0x90]);
        assert_eq!(state.counter(), 1);
    }

    #[test]
    fn rfc7539_second_block_via_counter() {
        let key = [0u8; KEY_BYTES];
        let mut iv = [0u8; IV_BYTES];
        iv[0] = 1; // initial counter = 1
        let mut state = ChaChaState::new(&key, &iv);
        let mut buf = [0u8; BLOCK_BYTES];
        block(&mut state, Rounds::R20, &mut buf);
        assert_eq!(buf[0..8], [0x9f, 0x07, 0xe7, 0xbe, 0x55, 0x51, 0x38, 0x7a]);
    }

    #[test]
    fn seek_wraps_modulo_2_64() {
        let key = [0u8; KEY_BYTES];
        let iv = [0u8; IV_BYTES];
        let mut state = ChaChaState::new(&key, &iv);
        state.seek(-1);
        assert_eq!(state.counter(), u64::MAX);
        state.seek(1);
        assert_eq!(state.counter(), 0);
    }

    #[test]
    fn seek_additivity() {
        let key = [7u8; KEY_BYTES];
        let iv = [3u8; IV_BYTES];
        let mut a = ChaChaState::new(&key, &iv);
        let mut b = ChaChaState::new(&key, &iv);
        a.seek(17);
        a.seek(-4);
        b.seek(13);
        assert_eq!(a.counter(), b.counter());
    }
}
