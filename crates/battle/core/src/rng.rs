//! Seeded randomness for a single battle.
//!
//! Every random decision in a battle (tie-break offsets, crits, dodges,
//! effect application) draws from one [`BattleRng`], so a fixed seed replays
//! the same battle.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns true with probability `p`, clamped to `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 || p.is_nan() {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.inner.gen_bool(p)
    }

    /// Uniform index in `0..len`, or `None` for an empty range.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.inner.gen_range(0..len))
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
