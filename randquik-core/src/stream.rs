//! Seekable, streaming keystream byte generator.
//!
//! Wraps a [`ChaChaState`] and the backend chosen for it, serving arbitrary
//! byte-aligned (not necessarily block-aligned) requests by keeping the
//! unconsumed tail of the last-generated batch in a carry-over buffer.

use zeroize::Zeroize;

use crate::backends::Backend;
use crate::rounds::Rounds;
use crate::state::{ChaChaState, BLOCK_BYTES, IV_BYTES, KEY_BYTES};

/// Largest batch any backend currently produces (AVX2: 8 blocks).
const MAX_BATCH_BYTES: usize = 512;

/// A seekable ChaCha keystream, generating output in backend-sized batches
/// and buffering any unconsumed tail so callers can request arbitrary byte
/// counts without losing alignment.
pub struct StreamCipher {
    state: ChaChaState,
    rounds: Rounds,
    backend: Backend,
    carry: [u8; MAX_BATCH_BYTES],
    /// Valid carry-over bytes are `carry[off..end]`.
    off: usize,
    end: usize,
}

impl StreamCipher {
    /// Builds a new cipher from a 256-bit key and 128-bit IV (initial
    /// counter + nonce), selecting the best backend for the running CPU.
    pub fn new(key: &[u8; KEY_BYTES], iv: &[u8; IV_BYTES], rounds: Rounds) -> Self {
        Self {
            state: ChaChaState::new(key, iv),
            rounds,
            backend: Backend::select(),
            carry: [0u8; MAX_BATCH_BYTES],
            off: 0,
            end: 0,
        }
    }

    /// Fills `out` completely with the next `out.len()` keystream bytes.
    pub fn update(&mut self, mut out: &mut [u8]) {
        // Drain any carried-over bytes from the last batch first.
        if self.off < self.end {
            let available = self.end - self.off;
            let take = available.min(out.len());
            out[..take].copy_from_slice(&self.carry[self.off..self.off + take]);
            self.off += take;
            out = &mut out[take..];
            if out.is_empty() {
                return;
            }
        }

        // Generate whole batches straight into the caller's buffer.
        let batch_bytes = self.backend.batch_bytes();
        let whole = (out.len() / batch_bytes) * batch_bytes;
        if whole > 0 {
            let written = self.backend.generate(&mut self.state, self.rounds, &mut out[..whole]);
            debug_assert_eq!(written, whole);
            out = &mut out[whole..];
        }
        if out.is_empty() {
            return;
        }

        // Remainder is shorter than one batch: generate a full batch into
        // the carry-over buffer and serve the prefix from it.
        debug_assert!(out.len() < batch_bytes);
        let mut batch_buf = [0u8; MAX_BATCH_BYTES];
        let dst = &mut batch_buf[..batch_bytes];
        let written = self.backend.generate(&mut self.state, self.rounds, dst);
        debug_assert_eq!(written, batch_bytes);
        out.copy_from_slice(&dst[..out.len()]);
        self.carry[..batch_bytes].copy_from_slice(dst);
        self.off = out.len();
        self.end = batch_bytes;
    }

    /// Seeks forward or backward by `delta` 64-byte blocks, wrapping modulo
    /// 2^64 blocks. Invalidates any carried-over bytes: the next [`update`]
    /// call starts exactly at the new block boundary.
    ///
    /// [`update`]: StreamCipher::update
    pub fn seek_blocks(&mut self, delta: i64) {
        self.state.seek(delta);
        self.off = 0;
        self.end = 0;
    }

    /// Current block counter, useful for reporting resumable offsets.
    pub fn counter(&self) -> u64 {
        self.state.counter()
    }

    /// Consumes and zeroes all key material and buffered keystream bytes.
    pub fn wipe(mut self) {
        self.state.clear();
        self.carry.zeroize();
        self.off = 0;
        self.end = 0;
    }
}

impl Drop for StreamCipher {
    fn drop(&mut self) {
        self.state.clear();
        self.carry.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; KEY_BYTES] {
        let mut k = [0u8; KEY_BYTES];
        for (i, b) in k.iter_mut().enumerate() {
            *b = i as u8;
        }
        k
    }

    #[test]
    fn zero_length_update_is_a_no_op() {
        let mut cipher = StreamCipher::new(&key(), &[0u8; IV_BYTES], Rounds::R20);
        let before = cipher.counter();
        cipher.update(&mut []);
        assert_eq!(cipher.counter(), before);
    }

    #[test]
    fn interleaved_updates_match_one_contiguous_call() {
        let iv = [0u8; IV_BYTES];
        let mut piecewise = StreamCipher::new(&key(), &iv, Rounds::R20);
        let mut whole = StreamCipher::new(&key(), &iv, Rounds::R20);

        let mut expected = vec![0u8; 1000];
        whole.update(&mut expected);

        let mut actual = vec![0u8; 1000];
        let mut pos = 0;
        for chunk_len in [1usize, 63, 64, 65, 200, 1, 506] {
            let end = (pos + chunk_len).min(actual.len());
            piecewise.update(&mut actual[pos..end]);
            pos = end;
        }
        assert_eq!(pos, actual.len());
        assert_eq!(actual, expected);
    }

    #[test]
    fn seek_then_update_matches_fresh_offset() {
        let iv = [0u8; IV_BYTES];
        let mut seeker = StreamCipher::new(&key(), &iv, Rounds::R20);
        seeker.seek_blocks(10);
        let mut got = [0u8; BLOCK_BYTES];
        seeker.update(&mut got);

        let mut fresh = StreamCipher::new(&key(), &iv, Rounds::R20);
        let mut skip = vec![0u8; 10 * BLOCK_BYTES];
        fresh.update(&mut skip);
        let mut expected = [0u8; BLOCK_BYTES];
        fresh.update(&mut expected);

        assert_eq!(got, expected);
    }

    #[test]
    fn wipe_zeroes_state() {
        let cipher = StreamCipher::new(&key(), &[0u8; IV_BYTES], Rounds::R20);
        cipher.wipe();
    }
}
