//! Iteration over live records
//!
//! All iterators visit used slots in ascending index order and skip free
//! ones. They know how many records remain, so they are exact-size.

use super::container::CompactPool;
use super::index::Index;
use super::slot::Slot;
use super::tag::PoolIndex;
use std::iter::{Enumerate, FusedIterator};
use std::{slice, vec};

macro_rules! live_records {
    ($name:ident, $item:ty, |$position:ident, $slot:ident| $extract:expr) => {
        impl<'a, T, I: PoolIndex> Iterator for $name<'a, T, I> {
            type Item = $item;

            fn next(&mut self) -> Option<Self::Item> {
                for ($position, $slot) in self.inner.by_ref() {
                    if let Some(item) = $extract {
                        self.remaining -= 1;
                        return Some(item);
                    }
                }
                None
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                (self.remaining, Some(self.remaining))
            }
        }

        impl<'a, T, I: PoolIndex> DoubleEndedIterator for $name<'a, T, I> {
            fn next_back(&mut self) -> Option<Self::Item> {
                while let Some(($position, $slot)) = self.inner.next_back() {
                    if let Some(item) = $extract {
                        self.remaining -= 1;
                        return Some(item);
                    }
                }
                None
            }
        }

        impl<'a, T, I: PoolIndex> ExactSizeIterator for $name<'a, T, I> {}

        impl<'a, T, I: PoolIndex> FusedIterator for $name<'a, T, I> {}
    };
}

/// Borrowing iterator over `(handle, record)` pairs
pub struct Iter<'a, T, I: PoolIndex> {
    inner: Enumerate<slice::Iter<'a, Slot<T, I>>>,
    remaining: usize,
}

impl<'a, T, I: PoolIndex> Iter<'a, T, I> {
    pub(crate) fn new(slots: &'a [Slot<T, I>], len: usize) -> Self {
        Self {
            inner: slots.iter().enumerate(),
            remaining: len,
        }
    }
}

impl<'a, T, I: PoolIndex> Clone for Iter<'a, T, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

live_records!(Iter, (Index<I>, &'a T), |position, slot| slot
    .value()
    .map(|value| (Index::at(position), value)));

/// Mutable iterator over `(handle, record)` pairs
pub struct IterMut<'a, T, I: PoolIndex> {
    inner: Enumerate<slice::IterMut<'a, Slot<T, I>>>,
    remaining: usize,
}

impl<'a, T, I: PoolIndex> IterMut<'a, T, I> {
    pub(crate) fn new(slots: &'a mut [Slot<T, I>], len: usize) -> Self {
        Self {
            inner: slots.iter_mut().enumerate(),
            remaining: len,
        }
    }
}

live_records!(IterMut, (Index<I>, &'a mut T), |position, slot| slot
    .value_mut()
    .map(|value| (Index::at(position), value)));

/// Owning iterator over `(handle, record)` pairs
pub struct IntoIter<T, I: PoolIndex> {
    inner: Enumerate<vec::IntoIter<Slot<T, I>>>,
    remaining: usize,
}

impl<T, I: PoolIndex> Iterator for IntoIter<T, I> {
    type Item = (Index<I>, T);

    fn next(&mut self) -> Option<Self::Item> {
        for (position, slot) in self.inner.by_ref() {
            if let Some(value) = slot.into_value() {
                self.remaining -= 1;
                return Some((Index::at(position), value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, I: PoolIndex> DoubleEndedIterator for IntoIter<T, I> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some((position, slot)) = self.inner.next_back() {
            if let Some(value) = slot.into_value() {
                self.remaining -= 1;
                return Some((Index::at(position), value));
            }
        }
        None
    }
}

impl<T, I: PoolIndex> ExactSizeIterator for IntoIter<T, I> {}

impl<T, I: PoolIndex> FusedIterator for IntoIter<T, I> {}

/// Records without their handles
pub struct Values<'a, T, I: PoolIndex>(Iter<'a, T, I>);

impl<'a, T, I: PoolIndex> Values<'a, T, I> {
    pub(crate) fn new(iter: Iter<'a, T, I>) -> Self {
        Values(iter)
    }
}

impl<'a, T, I: PoolIndex> Iterator for Values<'a, T, I> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T, I: PoolIndex> DoubleEndedIterator for Values<'a, T, I> {
    fn next_back(&mut self) -> Option<&'a T> {
        self.0.next_back().map(|(_, value)| value)
    }
}

impl<'a, T, I: PoolIndex> ExactSizeIterator for Values<'a, T, I> {}

impl<'a, T, I: PoolIndex> FusedIterator for Values<'a, T, I> {}

/// Handles of the live records
pub struct Indices<'a, T, I: PoolIndex>(Iter<'a, T, I>);

impl<'a, T, I: PoolIndex> Indices<'a, T, I> {
    pub(crate) fn new(iter: Iter<'a, T, I>) -> Self {
        Indices(iter)
    }
}

impl<'a, T, I: PoolIndex> Iterator for Indices<'a, T, I> {
    type Item = Index<I>;

    fn next(&mut self) -> Option<Index<I>> {
        self.0.next().map(|(index, _)| index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, T, I: PoolIndex> DoubleEndedIterator for Indices<'a, T, I> {
    fn next_back(&mut self) -> Option<Index<I>> {
        self.0.next_back().map(|(index, _)| index)
    }
}

impl<'a, T, I: PoolIndex> ExactSizeIterator for Indices<'a, T, I> {}

impl<'a, T, I: PoolIndex> FusedIterator for Indices<'a, T, I> {}

impl<'a, T, P, I: PoolIndex> IntoIterator for &'a CompactPool<T, P, I> {
    type Item = (Index<I>, &'a T);
    type IntoIter = Iter<'a, T, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, P, I: PoolIndex> IntoIterator for &'a mut CompactPool<T, P, I> {
    type Item = (Index<I>, &'a mut T);
    type IntoIter = IterMut<'a, T, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, P, I: PoolIndex> IntoIterator for CompactPool<T, P, I> {
    type Item = (Index<I>, T);
    type IntoIter = IntoIter<T, I>;

    fn into_iter(self) -> Self::IntoIter {
        let (slots, len) = self.into_parts();
        IntoIter {
            inner: slots.into_iter().enumerate(),
            remaining: len,
        }
    }
}
