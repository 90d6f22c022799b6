//! Bit-stealing slot tags
//!
//! A tag is one index-sized word. Its most significant bit says whether the
//! slot is used (0) or free (1); the remaining bits hold the index of the next
//! free slot when the slot is free.
//!
//! ```text
//!  u32 word:  [ kind | ............ value (31 bits) ............ ]
//!               MSB                                          LSB
//!
//!  value == BOTTOM (0x7fff_ffff)  →  end of the free list
//! ```

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::hash::Hash;

/// Integer types usable as pool indices and tag words
pub trait PoolIndex:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + 'static
{
    /// Width of the word in bits
    const BITS: u32;
    /// Most significant bit (the kind bit)
    const MASK: Self;
    /// `MAX / 2`: every value bit set, never a real slot
    const BOTTOM: Self;
    const ZERO: Self;

    fn to_usize(self) -> usize;

    /// Converts a slot position, `None` if it does not fit in the word
    fn from_usize(value: usize) -> Option<Self>;

    /// `self & MASK`
    fn kind_bits(self) -> Self;

    /// `self & !MASK`
    fn value_bits(self) -> Self;

    /// `value | (kind << (BITS - 1))`
    fn compose(value: Self, kind: SlotKind) -> Self;

    /// Number of addressable slots for this word type
    fn max_slots() -> usize {
        Self::BOTTOM.to_usize()
    }
}

macro_rules! impl_pool_index {
    ($($t:ty),*) => {$(
        impl PoolIndex for $t {
            const BITS: u32 = <$t>::BITS;
            const MASK: Self = !(<$t>::MAX / 2);
            const BOTTOM: Self = <$t>::MAX / 2;
            const ZERO: Self = 0;

            #[inline]
            fn to_usize(self) -> usize {
                usize::try_from(self).unwrap_or(usize::MAX)
            }

            #[inline]
            fn from_usize(value: usize) -> Option<Self> {
                <$t>::try_from(value).ok()
            }

            #[inline]
            fn kind_bits(self) -> Self {
                self & Self::MASK
            }

            #[inline]
            fn value_bits(self) -> Self {
                self & !Self::MASK
            }

            #[inline]
            fn compose(value: Self, kind: SlotKind) -> Self {
                value | ((kind as $t) << (Self::BITS - 1))
            }
        }

        impl TagField for $t {
            type Word = $t;

            fn tag(&self) -> $t {
                *self
            }

            fn set_tag(&mut self, word: $t) {
                *self = word;
            }
        }
    )*};
}

impl_pool_index!(u16, u32, u64, usize);

/// Whether a slot holds a live value or free-list bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Used = 0,
    Free = 1,
}

/// A record exposing one index-sized word reserved for pool bookkeeping
///
/// The top bit of the word belongs to the pool; records must not use it.
pub trait TagField {
    type Word: PoolIndex;

    fn tag(&self) -> Self::Word;

    fn set_tag(&mut self, word: Self::Word);
}

/// Kind stored in the top bit of a word
#[inline]
pub fn word_kind<W: PoolIndex>(word: W) -> SlotKind {
    if word.kind_bits() == W::ZERO {
        SlotKind::Used
    } else {
        SlotKind::Free
    }
}

/// Next free slot encoded in a word, `None` at the end of the list
#[inline]
pub fn word_link<W: PoolIndex>(word: W) -> Option<W> {
    let next = word.value_bits();
    if next == W::BOTTOM {
        None
    } else {
        Some(next)
    }
}

/// Builds a FREE word pointing at `next`
#[inline]
pub fn free_word<W: PoolIndex>(next: Option<W>) -> W {
    W::compose(next.unwrap_or(W::BOTTOM).value_bits(), SlotKind::Free)
}

/// Kind stored in the top bit of the tag
#[inline]
pub fn kind<R: TagField + ?Sized>(record: &R) -> SlotKind {
    word_kind(record.tag())
}

/// Tag with the kind bit cleared
#[inline]
pub fn value<R: TagField + ?Sized>(record: &R) -> R::Word {
    record.tag().value_bits()
}

/// Writes `value` and `kind` into the tag
#[inline]
pub fn set<R: TagField + ?Sized>(record: &mut R, value: R::Word, kind: SlotKind) {
    debug_assert!(
        value <= R::Word::BOTTOM,
        "tag value {} overlaps the kind bit",
        value
    );
    record.set_tag(R::Word::compose(value.value_bits(), kind));
}

/// Rewrites the kind bit, keeping the value bits
#[inline]
pub fn set_kind<R: TagField + ?Sized>(record: &mut R, kind: SlotKind) {
    let current = value(record);
    set(record, current, kind);
}

/// Next free slot encoded in the tag, `None` at the end of the list
#[inline]
pub fn link<R: TagField + ?Sized>(record: &R) -> Option<R::Word> {
    word_link(record.tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(<u32 as PoolIndex>::MASK, 0x8000_0000);
        assert_eq!(<u32 as PoolIndex>::BOTTOM, 0x7fff_ffff);
        assert_eq!(<u16 as PoolIndex>::MASK, 0x8000);
        assert_eq!(<u16 as PoolIndex>::BOTTOM, 0x7fff);
        assert_eq!(<u16 as PoolIndex>::max_slots(), 0x7fff);
        assert_eq!(<u64 as PoolIndex>::BOTTOM, u64::MAX / 2);
    }

    #[test]
    fn test_kind_and_value() {
        let mut word: u32 = 0;
        assert_eq!(kind(&word), SlotKind::Used);

        set(&mut word, 42, SlotKind::Free);
        assert_eq!(word, 0x8000_002a);
        assert_eq!(kind(&word), SlotKind::Free);
        assert_eq!(value(&word), 42);

        set_kind(&mut word, SlotKind::Used);
        assert_eq!(kind(&word), SlotKind::Used);
        assert_eq!(value(&word), 42);
    }

    #[test]
    fn test_free_word_links() {
        let end: u16 = free_word(None);
        assert_eq!(kind(&end), SlotKind::Free);
        assert_eq!(link(&end), None);

        let next: u16 = free_word(Some(7));
        assert_eq!(kind(&next), SlotKind::Free);
        assert_eq!(link(&next), Some(7));
    }

    #[test]
    fn test_from_usize_bounds() {
        assert_eq!(<u16 as PoolIndex>::from_usize(65_535), Some(65_535));
        assert_eq!(<u16 as PoolIndex>::from_usize(65_536), None);
        assert_eq!(<u64 as PoolIndex>::to_usize(9), 9);
    }
}
