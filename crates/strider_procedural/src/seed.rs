//! # World Seed
//!
//! Every random decision in a run comes from one `u64`. Independent streams
//! are derived per purpose, so adding draws to one stream never shifts
//! another.
//!
//! Given the same seed and the same tick inputs, a run produces **exactly**
//! the same world.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Stream used to pick chunk templates.
pub const STREAM_SELECTION: u64 = 0x5E1E_C710;

/// Stream used by the chunk generator.
pub const STREAM_GENERATOR: u64 = 0x6E4E_7A70;

/// Stream used for moving-obstacle catalog picks and speeds.
pub const STREAM_OBSTACLES: u64 = 0x0B57_AC1E;

/// World seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Builds the random stream for a purpose.
    #[must_use]
    pub fn rng(self, purpose: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive(purpose).value())
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0x5717_DE12_0000_0001)
    }
}
