//! Bidirectional cursors
//!
//! A cursor is a position in `[0, capacity]` of one pool. `capacity` is the
//! end position. Moving a cursor skips free slots, unlike raw handle
//! arithmetic.

use super::container::CompactPool;
use super::index::Index;
use super::tag::PoolIndex;
use crate::error::{Error, Result};
use std::fmt;
use std::ptr;

pub struct Cursor<'a, T, P, I: PoolIndex> {
    pool: &'a CompactPool<T, P, I>,
    position: usize,
}

impl<'a, T, P, I: PoolIndex> Cursor<'a, T, P, I> {
    /// Raw slot position, `capacity` at the end
    pub fn position(&self) -> usize {
        self.position
    }

    /// Handle under the cursor, `None` at the end
    pub fn index(&self) -> Option<Index<I>> {
        if self.is_end() {
            None
        } else {
            Index::from_usize(self.position)
        }
    }

    pub fn is_end(&self) -> bool {
        self.position >= self.pool.capacity()
    }

    /// Record under the cursor
    pub fn get(&self) -> Result<&'a T> {
        if self.is_end() {
            return Err(Error::OutOfRange {
                index: self.position,
                capacity: self.pool.capacity(),
            });
        }
        self.pool.try_get(Index::at(self.position))
    }

    /// Advance to the next used slot or the end
    pub fn move_next(&mut self) -> Result<()> {
        let capacity = self.pool.capacity();
        if self.position >= capacity {
            return Err(Error::CursorBounds("advancing past end"));
        }

        self.position += 1;
        while self.position < capacity && !self.pool.is_used(self.position) {
            self.position += 1;
        }
        Ok(())
    }

    /// Step back to the previous used slot
    ///
    /// Fails without moving when no used slot precedes the cursor.
    pub fn move_prev(&mut self) -> Result<()> {
        let end = self.position.min(self.pool.capacity());
        match (0..end).rev().find(|&position| self.pool.is_used(position)) {
            Some(position) => {
                self.position = position;
                Ok(())
            }
            None => Err(Error::CursorBounds("retreating before begin")),
        }
    }
}

impl<'a, T, P, I: PoolIndex> Clone for Cursor<'a, T, P, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, P, I: PoolIndex> Copy for Cursor<'a, T, P, I> {}

/// Same pool, same position
impl<'a, T, P, I: PoolIndex> PartialEq for Cursor<'a, T, P, I> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.pool, other.pool) && self.position == other.position
    }
}

impl<'a, T, P, I: PoolIndex> Eq for Cursor<'a, T, P, I> {}

impl<'a, T, P, I: PoolIndex> fmt::Debug for Cursor<'a, T, P, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("pool", &(self.pool as *const CompactPool<T, P, I>))
            .field("position", &self.position)
            .finish()
    }
}

impl<T, P, I: PoolIndex> CompactPool<T, P, I> {
    /// Cursor on the first used slot, or the end if the pool is empty
    pub fn begin(&self) -> Cursor<'_, T, P, I> {
        let position = (0..self.capacity())
            .find(|&position| self.is_used(position))
            .unwrap_or(self.capacity());
        Cursor {
            pool: self,
            position,
        }
    }

    /// Cursor one past the last slot
    pub fn end(&self) -> Cursor<'_, T, P, I> {
        Cursor {
            pool: self,
            position: self.capacity(),
        }
    }

    /// Cursor at a raw position, which may be free
    pub fn index_to(&self, index: Index<I>) -> Result<Cursor<'_, T, P, I>> {
        let position = index.to_usize();
        if position > self.capacity() {
            return Err(Error::OutOfRange {
                index: position,
                capacity: self.capacity(),
            });
        }
        Ok(Cursor {
            pool: self,
            position,
        })
    }

    /// Cursor on a record given a reference to it
    pub fn iterator_to(&self, value: &T) -> Option<Cursor<'_, T, P, I>> {
        self.index_of(value).map(|index| Cursor {
            pool: self,
            position: index.to_usize(),
        })
    }

    /// Whether `cursor` belongs to this pool and is at the end or on a used
    /// slot
    pub fn owns(&self, cursor: &Cursor<'_, T, P, I>) -> bool {
        ptr::eq(self, cursor.pool) && (cursor.is_end() || self.is_used(cursor.position))
    }

    /// Like [`owns`](Self::owns), excluding the end
    pub fn owns_dereferenceable(&self, cursor: &Cursor<'_, T, P, I>) -> bool {
        !cursor.is_end() && self.owns(cursor)
    }
}
