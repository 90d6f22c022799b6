//! Handles into a compact pool

use super::tag::{PoolIndex, TagField};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense handle to a slot in a [`CompactPool`](super::CompactPool)
///
/// A default-constructed handle is invalid: it holds `BOTTOM`, a value no
/// pool slot can reach because capacity is capped below it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Index<I: PoolIndex = u32>(I);

impl<I: PoolIndex> Index<I> {
    /// The invalid handle
    pub const INVALID: Self = Index(I::BOTTOM);

    /// Wrap a raw slot position
    pub fn new(raw: I) -> Self {
        Index(raw)
    }

    /// Build a handle from a `usize` slot position
    ///
    /// Returns `None` if the position does not fit in the index word or is
    /// the reserved sentinel.
    pub fn from_usize(position: usize) -> Option<Self> {
        I::from_usize(position)
            .filter(|raw| *raw < I::BOTTOM)
            .map(Index)
    }

    /// Handle for a position known to be addressable
    pub(crate) fn at(position: usize) -> Self {
        Self::from_usize(position).unwrap_or(Self::INVALID)
    }

    /// Underlying index word
    pub fn get(self) -> I {
        self.0
    }

    pub fn to_usize(self) -> usize {
        self.0.to_usize()
    }

    pub fn is_valid(self) -> bool {
        self.0 != I::BOTTOM
    }

    /// `None` for the invalid handle
    pub fn into_option(self) -> Option<Self> {
        if self.is_valid() {
            Some(self)
        } else {
            None
        }
    }

    /// Next raw position. Does not skip free slots and does not check that
    /// the result refers to a live element.
    pub fn incremented(self) -> Self {
        self.offset(1, true)
    }

    /// Previous raw position. Same caveats as [`Index::incremented`];
    /// decrementing position 0 yields the invalid handle.
    pub fn decremented(self) -> Self {
        self.offset(1, false)
    }

    fn offset(self, by: usize, forward: bool) -> Self {
        let position = self.to_usize();
        let moved = if forward {
            position.checked_add(by)
        } else {
            position.checked_sub(by)
        };
        moved.and_then(Self::from_usize).unwrap_or(Self::INVALID)
    }
}

impl<I: PoolIndex> Default for Index<I> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<I: PoolIndex> From<I> for Index<I> {
    fn from(raw: I) -> Self {
        Index(raw)
    }
}

impl<I: PoolIndex> From<Index<I>> for usize {
    fn from(index: Index<I>) -> usize {
        index.to_usize()
    }
}

impl<I: PoolIndex> TagField for Index<I> {
    type Word = I;

    fn tag(&self) -> I {
        self.0
    }

    fn set_tag(&mut self, word: I) {
        self.0 = word;
    }
}

impl<I: PoolIndex> fmt::Debug for Index<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Index({})", self.0)
        } else {
            write!(f, "Index(INVALID)")
        }
    }
}

impl<I: PoolIndex> fmt::Display for Index<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tag::{self, SlotKind};

    #[test]
    fn test_default_is_invalid() {
        let idx: Index = Index::default();
        assert!(!idx.is_valid());
        assert_eq!(idx.get(), u32::MAX / 2);
        assert_eq!(idx.into_option(), None);
        assert_eq!(format!("{:?}", idx), "Index(INVALID)");
    }

    #[test]
    fn test_raw_arithmetic() {
        let idx: Index<u16> = Index::new(4);
        assert_eq!(idx.incremented().get(), 5);
        assert_eq!(idx.decremented().get(), 3);
        assert!(!Index::<u16>::new(0).decremented().is_valid());
        assert!(!Index::<u16>::new(0x7ffe).incremented().is_valid());
    }

    #[test]
    fn test_conversions() {
        let idx = Index::from(9u32);
        assert_eq!(usize::from(idx), 9);
        assert_eq!(Index::<u32>::from_usize(9), Some(idx));
        assert_eq!(Index::<u16>::from_usize(0x7fff), None);
        assert_eq!(idx.to_string(), "#9");
    }

    #[test]
    fn test_handle_carries_tag() {
        let mut idx: Index<u32> = Index::new(0);
        tag::set(&mut idx, 17, SlotKind::Free);
        assert_eq!(tag::kind(&idx), SlotKind::Free);
        assert_eq!(tag::value(&idx), 17);
    }

    #[test]
    fn test_serde_transparent() {
        let idx: Index<u32> = Index::new(12);
        let json = serde_json::to_string(&idx).unwrap();
        assert_eq!(json, "12");
        let back: Index<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, idx);
    }
}
