//! SSE2-vectorized 4-block batch backend (x86/x86_64).
//!
//! SSE2 is a baseline feature of every x86_64 target, so this backend needs
//! no runtime probe; it is simply compiled in and selected whenever no wider
//! (AVX2) backend is available.
//!
//! Technique: each ChaCha matrix row is held in one `__m128i`, so a single
//! SSE2 instruction updates all four columns of that row at once. The
//! diagonal round is performed by rotating the lanes of the `b`/`c`/`d` rows
//! so the same column-style op lines up with the diagonal groups, then
//! rotating back (this is the standard technique described in
//! <https://eprint.iacr.org/2013/759>). Four independent instances (one per
//! batch slot, counters 0..3) are kept side by side to produce the full
//! 256-byte batch.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::rounds::Rounds;
use crate::state::{ChaChaState, BLOCK_BYTES, STATE_WORDS};

pub(crate) const WIDTH: usize = 4;
pub(crate) const BATCH_BYTES: usize = WIDTH * BLOCK_BYTES;

// Lane-rotation immediates for `_mm_shuffle_epi32`, derived so that
// `rotate_left_k(v)[j] == v[(j + k) % 4]`.
const ROT_LEFT_1: i32 = 0b00_11_10_01;
const ROT_LEFT_2: i32 = 0b01_00_11_10;
const ROT_LEFT_3: i32 = 0b10_01_00_11;

macro_rules! rotate_left_epi32 {
    ($v:expr, $shift:expr) => {{
        let left = _mm_slli_epi32($v, $shift);
        let right = _mm_srli_epi32($v, 32 - $shift);
        _mm_or_si128(left, right)
    }};
}

#[inline(always)]
unsafe fn quarter_round(a: &mut __m128i, b: &mut __m128i, c: &mut __m128i, d: &mut __m128i) {
    *a = _mm_add_epi32(*a, *b);
    *d = _mm_xor_si128(*d, *a);
    *d = rotate_left_epi32!(*d, 16);

    *c = _mm_add_epi32(*c, *d);
    *b = _mm_xor_si128(*b, *c);
    *b = rotate_left_epi32!(*b, 12);

    *a = _mm_add_epi32(*a, *b);
    *d = _mm_xor_si128(*d, *a);
    *d = rotate_left_epi32!(*d, 8);

    *c = _mm_add_epi32(*c, *d);
    *b = _mm_xor_si128(*b, *c);
    *b = rotate_left_epi32!(*b, 7);
}

/// Four independent ChaCha instances, one SSE2 register per matrix row.
struct Lane {
    a: __m128i,
    b: __m128i,
    c: __m128i,
    d: __m128i,
}

impl Lane {
    #[inline(always)]
    unsafe fn broadcast(state: &ChaChaState, offset: i64) -> Self {
        let w = &state.words;
        let a = _mm_set_epi32(w[3] as i32, w[2] as i32, w[1] as i32, w[0] as i32);
        let b = _mm_set_epi32(w[7] as i32, w[6] as i32, w[5] as i32, w[4] as i32);
        let c = _mm_set_epi32(w[11] as i32, w[10] as i32, w[9] as i32, w[8] as i32);
        let mut d = _mm_set_epi32(w[15] as i32, w[14] as i32, w[13] as i32, w[12] as i32);
        d = _mm_add_epi64(d, _mm_set_epi64x(0, offset));
        Lane { a, b, c, d }
    }

    #[inline(always)]
    unsafe fn double_round(&mut self) {
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = _mm_shuffle_epi32(self.a, ROT_LEFT_3);
        self.c = _mm_shuffle_epi32(self.c, ROT_LEFT_1);
        self.d = _mm_shuffle_epi32(self.d, ROT_LEFT_2);
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = _mm_shuffle_epi32(self.a, ROT_LEFT_1);
        self.c = _mm_shuffle_epi32(self.c, ROT_LEFT_3);
        self.d = _mm_shuffle_epi32(self.d, ROT_LEFT_2);
    }

    #[inline(always)]
    unsafe fn add(&self, orig: &Lane) -> Lane {
        Lane {
            a: _mm_add_epi32(self.a, orig.a),
            b: _mm_add_epi32(self.b, orig.b),
            c: _mm_add_epi32(self.c, orig.c),
            d: _mm_add_epi32(self.d, orig.d),
        }
    }

    #[inline(always)]
    unsafe fn store(&self, out: &mut [u8; BLOCK_BYTES]) {
        let mut words = [0u32; STATE_WORDS];
        _mm_storeu_si128(words[0..4].as_mut_ptr().cast(), self.a);
        _mm_storeu_si128(words[4..8].as_mut_ptr().cast(), self.b);
        _mm_storeu_si128(words[8..12].as_mut_ptr().cast(), self.c);
        _mm_storeu_si128(words[12..16].as_mut_ptr().cast(), self.d);
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }
}

#[inline(always)]
unsafe fn batch(state: &ChaChaState, rounds: Rounds, out: &mut [u8; BATCH_BYTES]) {
    let mut chunks = out.chunks_exact_mut(BLOCK_BYTES);
    for i in 0..WIDTH {
        let orig = Lane::broadcast(state, i as i64);
        let mut cur = Lane::broadcast(state, i as i64);
        for _ in 0..rounds.double_rounds() {
            cur.double_round();
        }
        let result = cur.add(&orig);
        let dst: &mut [u8; BLOCK_BYTES] = chunks.next().expect("width chunks").try_into().expect("64 bytes");
        result.store(dst);
    }
}

/// Fills `out` with as many full 256-byte batches as fit, advancing the
/// counter by 4 blocks per batch. Returns bytes written.
pub(crate) fn generate(state: &mut ChaChaState, rounds: Rounds, out: &mut [u8]) -> usize {
    let mut written = 0;
    for chunk in out.chunks_exact_mut(BATCH_BYTES) {
        let dst: &mut [u8; BATCH_BYTES] = chunk.try_into().expect("batch-sized chunk");
        // SAFETY: SSE2 is a baseline feature on every x86/x86_64 target.
        unsafe {
            batch(state, rounds, dst);
        }
        state.advance(WIDTH as u64);
        written += BATCH_BYTES;
    }
    written
}
