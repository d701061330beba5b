use std::num::NonZeroUsize;

use log::debug;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seeded random source owned by a single simulation run.
///
/// Xoshiro256++ keeps the draw stream identical across platforms, so a seed
/// fully determines every selection, order and strand choice. Pass it by
/// `&mut` into each operation; never share one between concurrent runs.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: Xoshiro256PlusPlus,
    seed: u64,
    draws: u64,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        debug!("Seeding random source with {}", seed);
        RandomSource {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draw operations served so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform integer in `0..bound`.
    pub fn next_int(&mut self, bound: NonZeroUsize) -> usize {
        self.draws += 1;
        self.rng.random_range(0..bound.get())
    }

    /// Fair coin flip.
    pub fn next_bool(&mut self) -> bool {
        self.draws += 1;
        self.rng.random_bool(0.5)
    }

    /// Unbiased in-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        self.draws += 1;
        items.shuffle(&mut self.rng);
    }
}
