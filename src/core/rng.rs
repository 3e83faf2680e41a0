//! Deterministic random number generation for the authoritative side.
//!
//! Shuffles and die rolls only ever execute on the host; the results
//! replicate to clients as plain values. A seeded ChaCha8 stream keeps
//! host behavior reproducible in tests.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG owned by the host table.
#[derive(Clone, Debug)]
pub struct TableRng {
    inner: ChaCha8Rng,
}

impl TableRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Shuffle a slice in place (uniform Fisher-Yates).
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Roll an integer in `min..=max`.
    ///
    /// Returns `min` when the bounds are inverted.
    pub fn roll(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }
}
