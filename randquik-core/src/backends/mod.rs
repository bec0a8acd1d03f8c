//! Backend selection: picks the widest keystream-generation routine the
//! running CPU supports, falling back to the portable scalar backend.
//!
//! AVX2 must be probed at runtime (it's an optional x86/x86_64 extension);
//! SSE2 and NEON are baseline on x86_64 and aarch64 respectively, so they
//! are selected unconditionally on those architectures with no probe.

mod soft;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod sse2;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod avx2;

#[cfg(target_arch = "aarch64")]
mod neon;

use crate::rounds::Rounds;
use crate::state::ChaChaState;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cfg_if::cfg_if! {
    if #[cfg(not(any(target_feature = "avx2")))] {
        cpufeatures::new!(avx2_token, "avx2");
    }
}

/// The concrete keystream-generation routine in use for a given cipher
/// instance. Chosen once at construction time and held for the instance's
/// lifetime — CPU features don't change mid-process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Backend {
    Soft,
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Sse2,
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Avx2,
    #[cfg(target_arch = "aarch64")]
    Neon,
}

impl Backend {
    /// Picks the best backend available on the running CPU.
    pub(crate) fn select() -> Self {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            #[cfg(target_feature = "avx2")]
            {
                return Backend::Avx2;
            }
            #[cfg(not(target_feature = "avx2"))]
            {
                if avx2_token::get() {
                    return Backend::Avx2;
                }
                return Backend::Sse2;
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            return Backend::Neon;
        }
        #[allow(unreachable_code)]
        Backend::Soft
    }

    /// Batch granularity, in bytes, this backend prefers to be called with.
    /// Callers may pass a shorter buffer; only whole batches are produced.
    pub(crate) const fn batch_bytes(self) -> usize {
        match self {
            Backend::Soft => soft::BATCH_BYTES,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => sse2::BATCH_BYTES,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => avx2::BATCH_BYTES,
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => neon::BATCH_BYTES,
        }
    }

    /// Number of blocks processed per batch.
    pub(crate) const fn width(self) -> usize {
        match self {
            Backend::Soft => soft::WIDTH,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => sse2::WIDTH,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => avx2::WIDTH,
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => neon::WIDTH,
        }
    }

    /// Fills `out` with as many full batches as fit, advancing `state`'s
    /// counter accordingly. Returns the number of bytes written, always a
    /// multiple of `BLOCK_BYTES` and at most `out.len()`.
    pub(crate) fn generate(self, state: &mut ChaChaState, rounds: Rounds, out: &mut [u8]) -> usize {
        match self {
            Backend::Soft => soft::generate(state, rounds, out),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Sse2 => sse2::generate(state, rounds, out),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => {
                // SAFETY: only reached when `select` confirmed AVX2 support,
                // either via `target_feature` or the runtime `avx2_token` probe.
                unsafe { avx2::generate(state, rounds, out) }
            }
            #[cfg(target_arch = "aarch64")]
            Backend::Neon => neon::generate(state, rounds, out),
        }
    }
}
