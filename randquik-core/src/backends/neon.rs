//! NEON-vectorized 4-block batch backend (aarch64).
//!
//! NEON is a baseline feature of every aarch64 target (unlike AVX2 on
//! x86_64), so this backend needs no runtime probe either — it is simply
//! compiled in and selected whenever the target architecture is aarch64.
//! Same row-per-register, rotate-for-diagonal technique as [`super::sse2`];
//! lane rotation uses `vextq_u32` in place of `_mm_shuffle_epi32`.

use core::arch::aarch64::*;

use crate::rounds::Rounds;
use crate::state::{ChaChaState, BLOCK_BYTES, STATE_WORDS};

pub(crate) const WIDTH: usize = 4;
pub(crate) const BATCH_BYTES: usize = WIDTH * BLOCK_BYTES;

macro_rules! rotate_left_u32 {
    ($v:expr, $shift:literal) => {{
        let left = vshlq_n_u32($v, $shift);
        let right = vshrq_n_u32($v, 32 - $shift);
        vorrq_u32(left, right)
    }};
}

#[inline(always)]
unsafe fn quarter_round(a: &mut uint32x4_t, b: &mut uint32x4_t, c: &mut uint32x4_t, d: &mut uint32x4_t) {
    *a = vaddq_u32(*a, *b);
    *d = veorq_u32(*d, *a);
    *d = rotate_left_u32!(*d, 16);

    *c = vaddq_u32(*c, *d);
    *b = veorq_u32(*b, *c);
    *b = rotate_left_u32!(*b, 12);

    *a = vaddq_u32(*a, *b);
    *d = veorq_u32(*d, *a);
    *d = rotate_left_u32!(*d, 8);

    *c = vaddq_u32(*c, *d);
    *b = veorq_u32(*b, *c);
    *b = rotate_left_u32!(*b, 7);
}

/// Four independent ChaCha instances, one NEON register per matrix row.
struct Lane {
    a: uint32x4_t,
    b: uint32x4_t,
    c: uint32x4_t,
    d: uint32x4_t,
}

impl Lane {
    #[inline(always)]
    unsafe fn broadcast(state: &ChaChaState, offset: i64) -> Self {
        let w = &state.words;
        let load = |i: usize| vld1q_u32(w[i..i + 4].as_ptr());
        let a = load(0);
        let b = load(4);
        let c = load(8);
        let mut d = load(12);
        let counter = (u64::from(w[12]) | (u64::from(w[13]) << 32)).wrapping_add(offset as u64);
        d = vsetq_lane_u32(counter as u32, d, 0);
        d = vsetq_lane_u32((counter >> 32) as u32, d, 1);
        Lane { a, b, c, d }
    }

    #[inline(always)]
    unsafe fn double_round(&mut self) {
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = vextq_u32(self.a, self.a, 3);
        self.c = vextq_u32(self.c, self.c, 1);
        self.d = vextq_u32(self.d, self.d, 2);
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = vextq_u32(self.a, self.a, 1);
        self.c = vextq_u32(self.c, self.c, 3);
        self.d = vextq_u32(self.d, self.d, 2);
    }

    #[inline(always)]
    unsafe fn add(&self, orig: &Lane) -> Lane {
        Lane {
            a: vaddq_u32(self.a, orig.a),
            b: vaddq_u32(self.b, orig.b),
            c: vaddq_u32(self.c, orig.c),
            d: vaddq_u32(self.d, orig.d),
        }
    }

    #[inline(always)]
    unsafe fn store(&self, out: &mut [u8; BLOCK_BYTES]) {
        let mut words = [0u32; STATE_WORDS];
        vst1q_u32(words[0..4].as_mut_ptr(), self.a);
        vst1q_u32(words[4..8].as_mut_ptr(), self.b);
        vst1q_u32(words[8..12].as_mut_ptr(), self.c);
        vst1q_u32(words[12..16].as_mut_ptr(), self.d);
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
        // SAFETY: NEON is a baseline feature on every aarch64 target.
        unsafe {
            batch(state, rounds, dst);
        }
        state.advance(WIDTH as u64);
        written += BATCH_BYTES;
    }
    written
}
