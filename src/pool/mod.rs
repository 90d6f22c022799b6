//! Compact Pool
//!
//! Index-addressed storage for large, churning collections of records such
//! as mesh cells or graph nodes. Records are referenced by dense integer
//! handles rather than pointers.
//!
//! # Architecture
//!
//! ```text
//! CompactPool<T, P, I>
//!   ├─→ slots:  [Used a][Used b][Free →3][Free ⊥][Used e] ...
//!   │              0       1       2        3       4
//!   ├─→ free_head: 2          (free list 2 → 3 → ⊥)
//!   └─→ policy:  ConstantSize | Doubling | GrowthConfig
//!
//! Free slot word (u32):  [1][ next free index, 31 bits ]
//!                         ^ kind bit: 0 used, 1 free
//! ```
//!
//! Erased slots are pushed on the free list and handed out again (LIFO)
//! before any growth. When the list is empty, the policy picks the size of
//! the next block; the new slots are threaded so they are handed out in
//! ascending order.

pub mod bench;
pub mod config;
pub mod container;
pub mod cursor;
pub mod growth;
pub mod index;
pub mod iter;
pub mod scenario_tests;
pub mod slot;
pub mod tag;

pub use config::PoolConfig;
pub use container::{CompactPool, PoolStats};
pub use cursor::Cursor;
pub use growth::{ConstantSize, Doubling, GrowthConfig, GrowthPolicy};
pub use index::Index;
pub use iter::{Indices, IntoIter, Iter, IterMut, Values};
pub use tag::{PoolIndex, SlotKind, TagField};
