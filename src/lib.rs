// Compact Pool - index-addressed object storage
// A slab of fixed-layout records addressed by dense integer handles

#![warn(rust_2018_idioms)]

pub mod pool;

// Re-exports for convenience
pub use pool::{CompactPool, GrowthPolicy, Index, PoolConfig};

/// Compact pool error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        #[error("Invalid handle: slot {index} is not in use")]
        InvalidHandle { index: usize },

        #[error("Index out of range: {index} >= capacity {capacity}")]
        OutOfRange { index: usize, capacity: usize },

        #[error("Cursor out of bounds: {0}")]
        CursorBounds(&'static str),

        #[error("Allocation failed: could not grow to {requested} slots: {reason}")]
        AllocationFailed { requested: usize, reason: String },

        #[error("Capacity overflow: {requested} slots exceeds index limit {limit}")]
        CapacityOverflow { requested: usize, limit: usize },

        #[error("Corrupt free list: {0}")]
        CorruptFreeList(String),

        #[error("Configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
