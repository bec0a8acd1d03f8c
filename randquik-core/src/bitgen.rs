//! Fixed-width numeric adapter over a [`StreamCipher`], for callers that
//! want `u32`/`u64`/`f64` draws instead of raw bytes.

use crate::rounds::Rounds;
use crate::state::{IV_BYTES, KEY_BYTES};
use crate::stream::StreamCipher;

/// Size of the pre-generated buffer backing [`BitGenerator`] draws.
const BUFFER_BYTES: usize = 512;

/// Produces fixed-width integers and doubles from a ChaCha keystream,
/// amortizing generation over a buffer instead of calling the backend once
/// per draw.
pub struct BitGenerator {
    cipher: StreamCipher,
    buffer: [u8; BUFFER_BYTES],
    pos: usize,
}

impl BitGenerator {
    /// Builds a generator from a 256-bit key and 128-bit IV.
    pub fn new(key: &[u8; KEY_BYTES], iv: &[u8; IV_BYTES], rounds: Rounds) -> Self {
        let mut cipher = StreamCipher::new(key, iv, rounds);
        let mut buffer = [0u8; BUFFER_BYTES];
        cipher.update(&mut buffer);
        Self { cipher, buffer, pos: 0 }
    }

    fn refill_if_needed(&mut self, needed: usize) {
        if self.pos + needed > BUFFER_BYTES {
            self.cipher.update(&mut self.buffer);
            self.pos = 0;
        }
    }

    fn take(&mut self, n: usize) -> &[u8] {
        self.refill_if_needed(n);
        let bytes = &self.buffer[self.pos..self.pos + n];
        self.pos += n;
        bytes
    }

    /// Draws the next 32 bits as a little-endian `u32`.
    pub fn next_uint32(&mut self) -> u32 {
        let bytes: [u8; 4] = self.take(4).try_into().expect("4 bytes");
        u32::from_le_bytes(bytes)
    }

    /// Draws the next 64 bits as a little-endian `u64`.
    pub fn next_uint64(&mut self) -> u64 {
        let bytes: [u8; 8] = self.take(8).try_into().expect("8 bytes");
        u64::from_le_bytes(bytes)
    }

    /// Draws a `f64` uniform on `[0, 1)`, using the top 53 bits of a 64-bit
    /// draw (the full mantissa width of `f64`).
    pub fn next_double(&mut self) -> f64 {
        let raw = self.next_uint64() >> 11;
        (raw as f64) * (1.0 / (1u64 << 53) as f64)
    }

    /// Consumes and zeroes all underlying key material.
    pub fn wipe(self) {
        self.cipher.wipe();
    }
}

#[cfg(feature = "rand_core")]
mod rand_core_impl {
    use super::BitGenerator;
    use crate::rounds::Rounds;
    use crate::state::{IV_BYTES, KEY_BYTES};
    use rand_core::{RngCore, SeedableRng};

    impl RngCore for BitGenerator {
        fn next_u32(&mut self) -> u32 {
            self.next_uint32()
        }

        fn next_u64(&mut self) -> u64 {
            self.next_uint64()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let mut pos = 0;
            while pos < dest.len() {
                let take = (dest.len() - pos).min(super::BUFFER_BYTES);
                self.refill_if_needed(take);
                let chunk = self.take(take);
                dest[pos..pos + take].copy_from_slice(chunk);
                pos += take;
            }
        }
    }

    /// Seed material for [`BitGenerator`] as a [`rand_core`] source: a
    /// 256-bit key followed by a 128-bit IV (initial counter + nonce).
    impl SeedableRng for BitGenerator {
        type Seed = [u8; KEY_BYTES + IV_BYTES];

        fn from_seed(seed: Self::Seed) -> Self {
            let key: [u8; KEY_BYTES] = seed[..KEY_BYTES].try_into().expect("key-sized prefix");
            let iv: [u8; IV_BYTES] = seed[KEY_BYTES..].try_into().expect("iv-sized suffix");
            BitGenerator::new(&key, &iv, Rounds::default())
        }
    }
}
