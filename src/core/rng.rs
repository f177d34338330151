//! Deterministic random number generation.
//!
//! A match seeded the same way replays identically: `rn()` getters and
//! `Shuffle` commands all draw from this one seeded stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG owned by a match.
#[derive(Clone, Debug)]
pub struct MatchRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl MatchRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random integer in the inclusive range `[lo, hi]`.
    ///
    /// Swapped bounds are tolerated.
    pub fn int_range(&mut self, lo: i64, hi: i64) -> i64 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.inner.gen_range(lo..=hi)
    }

    /// Random float in `[lo, hi)`.
    pub fn float_range(&mut self, lo: f64, hi: f64) -> f64 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if lo == hi {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let mut a = MatchRng::new(7);
        let mut b = MatchRng::new(7);
        for _ in 0..10 {
            assert_eq!(a.int_range(0, 100), b.int_range(0, 100));
        }
    }

    #[test]
    fn test_int_range_inclusive() {
        let mut rng = MatchRng::new(1);
        for _ in 0..50 {
            let v = rng.int_range(1, 3);
            assert!((1..=3).contains(&v));
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let mut rng = MatchRng::new(1);
        let v = rng.int_range(5, 2);
        assert!((2..=5).contains(&v));
    }

    #[test]
    fn test_shuffle_deterministic() {
        let mut a = MatchRng::new(9);
        let mut b = MatchRng::new(9);
        let mut va: Vec<u32> = (0..20).collect();
        let mut vb: Vec<u32> = (0..20).collect();
        a.shuffle(&mut va);
        b.shuffle(&mut vb);
        assert_eq!(va, vb);
    }
}
