//! # Terrain RNG
//!
//! Every manipulator call owns one [`TerrainRng`]. There is no process-wide
//! generator, so a seeded call replays identically no matter what ran before.

use std::f64::consts::TAU;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded random source for terrain algorithms.
pub struct TerrainRng {
    rng: ChaCha8Rng,
}

impl TerrainRng {
    /// Creates a generator from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed derived from the wall clock, for unseeded calls.
    #[must_use]
    pub fn time_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0x5EED, |d| d.as_nanos() as u64)
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.rng.gen_bool(p)
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[low, high)`; returns `low` for an empty range.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) * self.unit()
    }

    /// Uniform integer in `[low, high]`.
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Uniform index in `[0, len)`. `len` must be positive.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }

    /// Standard normal sample (Box-Muller).
    pub fn gaussian(&mut self) -> f64 {
        let u1 = self.unit().max(f64::MIN_POSITIVE);
        let u2 = self.unit();
        (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    /// Random point at a distance in `[min_dist, max_dist)` around the origin.
    pub fn polar_offset(&mut self, min_dist: f64, max_dist: f64) -> (f64, f64) {
        let angle = self.uniform(0.0, TAU);
        let dist = self.uniform(min_dist, max_dist);
        (angle.cos() * dist, angle.sin() * dist)
    }
}
