//! AVX2-vectorized 8-block batch backend (x86/x86_64).
//!
//! Same column/diagonal-rotation technique as [`super::sse2`], but each
//! 256-bit register packs two independent instances (one per 128-bit lane),
//! so four `__m256i`-per-row groups produce the full 8-block, 512-byte
//! batch. Selected only when AVX2 is detected at runtime (see
//! [`super::Backend::select`]).

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::rounds::Rounds;
use crate::state::{ChaChaState, BLOCK_BYTES, STATE_WORDS};

pub(crate) const WIDTH: usize = 8;
const HALF_WIDTH: usize = WIDTH / 2;
pub(crate) const BATCH_BYTES: usize = WIDTH * BLOCK_BYTES;

const ROT_LEFT_1: i32 = 0b00_11_10_01;
const ROT_LEFT_2: i32 = 0b01_00_11_10;
const ROT_LEFT_3: i32 = 0b10_01_00_11;

macro_rules! rotate_left_epi32 {
    ($v:expr, $shift:expr) => {{
        let left = _mm256_slli_epi32($v, $shift);
        let right = _mm256_srli_epi32($v, 32 - $shift);
        _mm256_or_si256(left, right)
    }};
}

#[inline(always)]
unsafe fn quarter_round(a: &mut __m256i, b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    *a = _mm256_add_epi32(*a, *b);
    *d = _mm256_xor_si256(*d, *a);
    *d = rotate_left_epi32!(*d, 16);

    *c = _mm256_add_epi32(*c, *d);
    *b = _mm256_xor_si256(*b, *c);
    *b = rotate_left_epi32!(*b, 12);

    *a = _mm256_add_epi32(*a, *b);
    *d = _mm256_xor_si256(*d, *a);
    *d = rotate_left_epi32!(*d, 8);

    *c = _mm256_add_epi32(*c, *d);
    *b = _mm256_xor_si256(*b, *c);
    *b = rotate_left_epi32!(*b, 7);
}

/// Two lane-pairs (4 instances) per row group, `HALF_WIDTH` groups total.
struct LanePair {
    a: __m256i,
    b: __m256i,
    c: __m256i,
    d: __m256i,
}

impl LanePair {
    /// `low`/`high` are the counter offsets for the low/high 128-bit lanes.
    #[inline(always)]
    unsafe fn broadcast(state: &ChaChaState, low: i64, high: i64) -> Self {
        let w = &state.words;
        let row = |i: usize| _mm_set_epi32(w[i + 3] as i32, w[i + 2] as i32, w[i + 1] as i32, w[i] as i32);
        let a = _mm256_broadcastsi128_si256(row(0));
        let b = _mm256_broadcastsi128_si256(row(4));
        let c = _mm256_broadcastsi128_si256(row(8));
        let mut d = _mm256_broadcastsi128_si256(row(12));
        d = _mm256_add_epi64(d, _mm256_set_epi64x(0, high, 0, low));
        LanePair { a, b, c, d }
    }

    #[inline(always)]
    unsafe fn double_round(&mut self) {
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = _mm256_shuffle_epi32(self.a, ROT_LEFT_3);
        self.c = _mm256_shuffle_epi32(self.c, ROT_LEFT_1);
        self.d = _mm256_shuffle_epi32(self.d, ROT_LEFT_2);
        quarter_round(&mut self.a, &mut self.b, &mut self.c, &mut self.d);
        self.a = _mm256_shuffle_epi32(self.a, ROT_LEFT_1);
        self.c = _mm256_shuffle_epi32(self.c, ROT_LEFT_3);
        self.d = _mm256_shuffle_epi32(self.d, ROT_LEFT_2);
    }

    #[inline(always)]
    unsafe fn add(&self, orig: &LanePair) -> LanePair {
        LanePair {
            a: _mm256_add_epi32(self.a, orig.a),
            b: _mm256_add_epi32(self.b, orig.b),
            c: _mm256_add_epi32(self.c, orig.c),
            d: _mm256_add_epi32(self.d, orig.d),
        }
    }

    /// Stores the low-lane block into `low_out`, the high-lane block into `high_out`.
    #[inline(always)]
    unsafe fn store(&self, low_out: &mut [u8; BLOCK_BYTES], high_out: &mut [u8; BLOCK_BYTES]) {
        let extract = |reg: __m256i, idx: i32, out: &mut [u8; BLOCK_BYTES], row_idx: usize| {
            let half = if idx == 0 {
                _mm256_extracti128_si256(reg, 0)
            } else {
                _mm256_extracti128_si256(reg, 1)
            };
            let mut words = [0u32; 4];
            _mm_storeu_si128(words.as_mut_ptr().cast(), half);
            for (chunk, word) in out[row_idx * 16..row_idx * 16 + 16]
                .chunks_exact_mut(4)
                .zip(words.iter())
            {
                chunk.copy_from_slice(&word.to_le_bytes());
            }
        };
        extract(self.a, 0, low_out, 0);
        extract(self.b, 0, low_out, 1);
        extract(self.c, 0, low_out, 2);
        extract(self.d, 0, low_out, 3);
        extract(self.a, 1, high_out, 0);
        extract(self.b, 1, high_out, 1);
        extract(self.c, 1, high_out, 2);
        extract(self.d, 1, high_out, 3);
    }
}

#[inline(always)]
unsafe fn batch(state: &ChaChaState, rounds: Rounds, out: &mut [u8; BATCH_BYTES]) {
    for g in 0..HALF_WIDTH {
        let low = (2 * g) as i64;
        let high = (2 * g + 1) as i64;
        let orig = LanePair::broadcast(state, low, high);
        let mut cur = LanePair::broadcast(state, low, high);
        for _ in 0..rounds.double_rounds() {
            cur.double_round();
        }
        let result = cur.add(&orig);
        let base = g * 2 * BLOCK_BYTES;
        let (low_slice, rest) = out[base..].split_at_mut(BLOCK_BYTES);
        let (high_slice, _) = rest.split_at_mut(BLOCK_BYTES);
        let low_dst: &mut [u8; BLOCK_BYTES] = low_slice.try_into().expect("64 bytes");
        let high_dst: &mut [u8; BLOCK_BYTES] = high_slice.try_into().expect("64 bytes");
        result.store(low_dst, high_dst);
    }
}

/// # Safety
/// Caller must have confirmed AVX2 is available on the running CPU.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn generate(state: &mut ChaChaState, rounds: Rounds, out: &mut [u8]) -> usize {
    let mut written = 0;
    for chunk in out.chunks_exact_mut(BATCH_BYTES) {
        let dst: &mut [u8; BATCH_BYTES] = chunk.try_into().expect("batch-sized chunk");
        batch(state, rounds, dst);
        state.advance(WIDTH as u64);
        written += BATCH_BYTES;
    }
    written
}

#[allow(dead_code)]
const _: () = assert!(STATE_WORDS == 16);
