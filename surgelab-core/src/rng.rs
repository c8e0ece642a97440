//! Deterministic seeding for universe sampling.
//!
//! A master seed expands into per-(scope, label) sub-seeds via BLAKE3, so a
//! given config samples the same symbols regardless of call order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Sub-seed for a `(scope, label)` pair, e.g. `("mining", "KOSPI")`.
    pub fn sub_seed(&self, scope: &str, label: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&[0]);
        hasher.update(label.as_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    pub fn rng_for(&self, scope: &str, label: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(scope, label))
    }

    /// Up to `k` items chosen by a seeded shuffle. The input is sorted
    /// first so the result depends only on its contents.
    pub fn sample<T: Clone + Ord>(&self, items: &[T], k: usize, scope: &str) -> Vec<T> {
        let mut pool = items.to_vec();
        pool.sort();
        pool.dedup();
        pool.shuffle(&mut self.rng_for(scope, "sample"));
        pool.truncate(k);
        pool
    }
}
