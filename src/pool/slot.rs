//! Slot management for compact pools

use super::tag::{self, PoolIndex, SlotKind};

/// One position of the backing array
///
/// `Free` carries a tag word: kind bit set, value bits pointing at the next
/// free slot (or `BOTTOM`).
#[derive(Debug, Clone)]
pub(crate) enum Slot<T, I: PoolIndex> {
    Used(T),
    Free(I),
}

impl<T, I: PoolIndex> Slot<T, I> {
    /// Create a free slot linking to `next`
    pub(crate) fn free(next: Option<I>) -> Self {
        Slot::Free(tag::free_word(next))
    }

    pub(crate) fn kind(&self) -> SlotKind {
        match self {
            Slot::Used(_) => SlotKind::Used,
            Slot::Free(word) => tag::word_kind(*word),
        }
    }

    pub(crate) fn is_used(&self) -> bool {
        matches!(self, Slot::Used(_))
    }

    /// Next free slot, `None` for used slots and at the end of the list
    pub(crate) fn next_free(&self) -> Option<I> {
        match self {
            Slot::Free(word) => tag::word_link(*word),
            Slot::Used(_) => None,
        }
    }

    pub(crate) fn value(&self) -> Option<&T> {
        match self {
            Slot::Used(value) => Some(value),
            Slot::Free(_) => None,
        }
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Used(value) => Some(value),
            Slot::Free(_) => None,
        }
    }

    pub(crate) fn into_value(self) -> Option<T> {
        match self {
            Slot::Used(value) => Some(value),
            Slot::Free(_) => None,
        }
    }
}
