//! Randomness used for the review interleaving trial.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial: succeeds with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// ChaCha8-backed generator, reproducible when seeded.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always returns the same draw. `FixedRandom(0.0)` makes every trial with
/// `p > 0` succeed; `FixedRandom(1.0)` makes every trial fail.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl FixedRandom {
    pub const ALWAYS: FixedRandom = FixedRandom(0.0);
    pub const NEVER: FixedRandom = FixedRandom(1.0);
}

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..20 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn test_seeded_random_in_unit_interval() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "draw {} out of range", v);
        }
    }

    #[test]
    fn test_chance_frequency_close_to_p() {
        let mut rng = SeededRandom::new(42);
        let hits = (0..10_000).filter(|_| rng.chance(0.7)).count();
        let rate = hits as f64 / 10_000.0;
        assert!((rate - 0.7).abs() < 0.03, "rate {} too far from 0.7", rate);
    }

    #[test]
    fn test_fixed_random_extremes() {
        let mut always = FixedRandom::ALWAYS;
        let mut never = FixedRandom::NEVER;
        assert!(always.chance(0.7));
        assert!(!never.chance(0.7));
        assert!(!always.chance(0.0));
        assert!(!never.chance(1.0));
    }
}
