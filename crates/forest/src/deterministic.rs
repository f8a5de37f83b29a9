//! Deterministic utilities for reproducible training
//!
//! Seeded xoshiro streams and split tie-breaking, so that the same data and
//! seed always grow the same trees.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Random stream used for bootstrap draws, feature subsampling and holdout
/// shuffles.
pub type TrainingRng = Xoshiro256PlusPlus;

/// Stream for a master seed.
pub fn seeded_rng(seed: u64) -> TrainingRng {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Seed of tree `tree_idx` in a forest seeded with `seed`. SplitMix64
/// finalizer over the pair, so neighbouring trees get unrelated streams.
pub fn tree_seed(seed: u64, tree_idx: usize) -> u64 {
    let mut z = seed ^ (tree_idx as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw `n_rows` row indices with replacement; returns how often each row
/// was drawn.
pub fn bootstrap_weights(rng: &mut TrainingRng, n_rows: usize) -> Vec<u32> {
    let mut counts = vec![0u32; n_rows];
    if n_rows == 0 {
        return counts;
    }
    for _ in 0..n_rows {
        counts[rng.gen_range(0..n_rows)] += 1;
    }
    counts
}

/// Pick `k` distinct values from `0..n`, returned in ascending order.
pub fn sample_without_replacement(rng: &mut TrainingRng, n: usize, k: usize) -> Vec<usize> {
    let k = k.min(n);
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        pool.swap(i, j);
    }
    let mut picked = pool[..k].to_vec();
    picked.sort_unstable();
    picked
}

/// Deterministic tie-breaker for split selection.
/// Among equal-gain candidates the lowest (feature, position) wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub position: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, position: usize) -> Self {
        Self {
            feature_idx,
            position,
        }
    }
}
