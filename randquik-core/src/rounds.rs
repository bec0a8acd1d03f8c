//! The number of ChaCha double-rounds to perform per block.

/// Selects the ChaCha variant by its round count.
///
/// ChaCha20 (the default) runs 10 double-rounds; ChaCha12 and ChaCha8 trade
/// security margin for speed by running fewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounds {
    /// ChaCha8: 4 double-rounds.
    R8,
    /// ChaCha12: 6 double-rounds.
    R12,
    /// ChaCha20: 10 double-rounds.
    R20,
}

impl Rounds {
    /// Number of column+diagonal double-rounds this variant performs.
    #[inline(always)]
    pub(crate) const fn double_rounds(self) -> usize {
        match self {
            Rounds::R8 => 4,
            Rounds::R12 => 6,
            Rounds::R20 => 10,
        }
    }

    /// Parses a raw round count, accepting only the three defined variants.
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            8 => Some(Rounds::R8),
            12 => Some(Rounds::R12),
            20 => Some(Rounds::R20),
            _ => None,
        }
    }

    /// The raw round count (8, 12, or 20).
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Rounds::R8 => 8,
            Rounds::R12 => 12,
            Rounds::R20 => 20,
        }
    }
}

impl Default for Rounds {
    fn default() -> Self {
        Rounds::R20
    }
}
