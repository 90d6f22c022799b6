//! Growth policies for compact pools
//!
//! A policy decides how many slots the next block adds once the free list
//! runs dry. Block sizes are `NonZeroUsize`, so a policy cannot stall growth.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default size of the first block
pub const DEFAULT_FIRST_BLOCK: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(size) => size,
    None => unreachable!(),
};

/// Rule choosing the size of each new block
pub trait GrowthPolicy {
    /// Block size used for the first growth and after `clear`
    fn first_block_size(&self) -> NonZeroUsize;

    /// Block size for the growth after the one that brought the pool to
    /// `capacity` slots using `current` as block size
    fn next_block_size(&self, capacity: usize, current: NonZeroUsize) -> NonZeroUsize;
}

/// Every block has the same size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantSize {
    pub block_size: NonZeroUsize,
}

impl ConstantSize {
    pub fn new(block_size: NonZeroUsize) -> Self {
        Self { block_size }
    }
}

impl Default for ConstantSize {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_BLOCK)
    }
}

impl GrowthPolicy for ConstantSize {
    fn first_block_size(&self) -> NonZeroUsize {
        self.block_size
    }

    fn next_block_size(&self, _capacity: usize, current: NonZeroUsize) -> NonZeroUsize {
        current
    }
}

/// Each block is as large as the whole pool, doubling capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doubling {
    pub first_block_size: NonZeroUsize,
}

impl Doubling {
    pub fn new(first_block_size: NonZeroUsize) -> Self {
        Self { first_block_size }
    }
}

impl Default for Doubling {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_BLOCK)
    }
}

impl GrowthPolicy for Doubling {
    fn first_block_size(&self) -> NonZeroUsize {
        self.first_block_size
    }

    fn next_block_size(&self, capacity: usize, current: NonZeroUsize) -> NonZeroUsize {
        NonZeroUsize::new(capacity).unwrap_or(current)
    }
}

/// Policy selected at runtime, e.g. from a configuration file
///
/// ```toml
/// [growth]
/// policy = "constant"
/// block_size = 256
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum GrowthConfig {
    Constant { block_size: NonZeroUsize },
    Doubling { first_block_size: NonZeroUsize },
}

impl Default for GrowthConfig {
    fn default() -> Self {
        GrowthConfig::Doubling {
            first_block_size: DEFAULT_FIRST_BLOCK,
        }
    }
}

impl GrowthPolicy for GrowthConfig {
    fn first_block_size(&self) -> NonZeroUsize {
        match self {
            GrowthConfig::Constant { block_size } => ConstantSize::new(*block_size).first_block_size(),
            GrowthConfig::Doubling { first_block_size } => {
                Doubling::new(*first_block_size).first_block_size()
            }
        }
    }

    fn next_block_size(&self, capacity: usize, current: NonZeroUsize) -> NonZeroUsize {
        match self {
            GrowthConfig::Constant { block_size } => {
                ConstantSize::new(*block_size).next_block_size(capacity, current)
            }
            GrowthConfig::Doubling { first_block_size } => {
                Doubling::new(*first_block_size).next_block_size(capacity, current)
            }
        }
    }
}

/// Capacity and next block size after growing from `capacity` with
/// `block_size` until at least `target` slots exist, never past `limit`
///
/// Returns `(capacity, block_size)` unchanged when `target <= capacity`.
pub fn grow_until<P: GrowthPolicy + ?Sized>(
    policy: &P,
    mut capacity: usize,
    mut block_size: NonZeroUsize,
    target: usize,
    limit: usize,
) -> (usize, NonZeroUsize) {
    let target = target.min(limit);
    while capacity < target {
        capacity = capacity.saturating_add(block_size.get()).min(limit);
        block_size = policy.next_block_size(capacity, block_size);
    }
    (capacity, block_size)
}
