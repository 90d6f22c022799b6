//! Compact pool implementation

use super::config::PoolConfig;
use super::growth::{grow_until, Doubling, GrowthConfig, GrowthPolicy};
use super::index::Index;
use super::iter::{Indices, Iter, IterMut, Values};
use super::slot::Slot;
use super::tag::{self, PoolIndex, SlotKind};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::mem;
use std::num::NonZeroUsize;
use std::ops;
use std::ptr;
use tracing::{debug, trace};

/// Index-addressed pool of `T` records
///
/// Records live in one contiguous array of slots. Erased slots are chained
/// into a LIFO free list and reused before the pool grows; growth appends a
/// block whose size comes from the policy `P`.
///
/// Handles ([`Index`]) stay valid across insertions, erasures of other
/// slots and growth. References into the pool do not survive growth, which
/// the borrow checker enforces.
pub struct CompactPool<T, P = Doubling, I: PoolIndex = u32> {
    /// Backing array, `slots.len()` is the capacity
    slots: Vec<Slot<T, I>>,
    /// Number of used slots
    len: usize,
    /// Size of the next block
    block_size: NonZeroUsize,
    /// Head of the free list
    free_head: Option<I>,
    policy: P,
}

impl<T, P: GrowthPolicy + Default, I: PoolIndex> CompactPool<T, P, I> {
    /// Create an empty pool with the default policy
    pub fn new() -> Self {
        Self::with_policy(P::default())
    }

    /// Create a pool holding every item of `iter`, in iteration order
    pub fn try_from_iter<It: IntoIterator<Item = T>>(iter: It) -> Result<Self> {
        let mut pool = Self::new();
        pool.try_extend(iter)?;
        Ok(pool)
    }
}

impl<T, P: GrowthPolicy + Default, I: PoolIndex> Default for CompactPool<T, P, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I: PoolIndex> CompactPool<T, GrowthConfig, I> {
    /// Create a pool from a configuration, pre-sizing it if requested
    pub fn with_config(config: &PoolConfig) -> Result<Self> {
        let mut pool = Self::with_policy(config.growth);
        if let Some(capacity) = config.initial_capacity {
            pool.reserve(capacity)?;
        }
        Ok(pool)
    }
}

impl<T, P, I: PoolIndex> CompactPool<T, P, I> {
    /// Number of live records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, used and free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Size of the block the next growth will add
    pub fn block_size(&self) -> usize {
        self.block_size.get()
    }

    /// Largest capacity the index type can address
    pub fn max_capacity(&self) -> usize {
        I::max_slots()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Whether the slot at `position` holds a live record
    pub fn is_used(&self, position: usize) -> bool {
        self.slots.get(position).map_or(false, Slot::is_used)
    }

    pub fn contains(&self, index: Index<I>) -> bool {
        index.is_valid() && self.is_used(index.to_usize())
    }

    pub fn get(&self, index: Index<I>) -> Option<&T> {
        if !index.is_valid() {
            return None;
        }
        self.slots.get(index.to_usize())?.value()
    }

    pub fn get_mut(&mut self, index: Index<I>) -> Option<&mut T> {
        if !index.is_valid() {
            return None;
        }
        self.slots.get_mut(index.to_usize())?.value_mut()
    }

    /// Like [`get`](Self::get), reporting why the handle is unusable
    pub fn try_get(&self, index: Index<I>) -> Result<&T> {
        let position = self.checked_position(index)?;
        self.slots[position]
            .value()
            .ok_or(Error::InvalidHandle { index: position })
    }

    pub fn try_get_mut(&mut self, index: Index<I>) -> Result<&mut T> {
        let position = self.checked_position(index)?;
        self.slots[position]
            .value_mut()
            .ok_or(Error::InvalidHandle { index: position })
    }

    /// Remove the record at `index`, returning it
    ///
    /// The slot becomes the head of the free list, so the next insertion
    /// reuses it.
    pub fn erase(&mut self, index: Index<I>) -> Result<T> {
        let position = self.checked_position(index)?;
        if !self.slots[position].is_used() {
            return Err(Error::InvalidHandle { index: position });
        }

        let removed = mem::replace(&mut self.slots[position], Slot::free(self.free_head));
        self.free_head = Some(index.get());
        self.len -= 1;

        trace!(%index, len = self.len, "erased record");
        removed
            .into_value()
            .ok_or(Error::InvalidHandle { index: position })
    }

    /// Erase every live record in `[first, last)`, returning how many were
    /// removed. Free slots in the range are skipped.
    pub fn erase_range(&mut self, first: Index<I>, last: Index<I>) -> Result<usize> {
        let capacity = self.capacity();
        let (start, end) = (first.to_usize(), last.to_usize());
        if end > capacity || start > end {
            return Err(Error::OutOfRange {
                index: end.max(start),
                capacity,
            });
        }

        let mut erased = 0;
        for position in start..end {
            if self.slots[position].is_used() {
                self.erase(Index::at(position))?;
                erased += 1;
            }
        }
        Ok(erased)
    }

    /// Exchange the whole state of two pools
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Slot position of a reference into this pool
    ///
    /// Returns 0 when `value` does not point into the backing array, so a
    /// result of 0 is ambiguous. Prefer [`index_of`](Self::index_of).
    pub fn compute_index(&self, value: &T) -> I {
        self.position_of(value)
            .and_then(I::from_usize)
            .unwrap_or(I::ZERO)
    }

    /// Handle of a live record given a reference to it
    pub fn index_of(&self, value: &T) -> Option<Index<I>> {
        let position = self.position_of(value)?;
        match self.slots[position].value() {
            Some(stored) if ptr::eq(stored, value) => Some(Index::at(position)),
            _ => None,
        }
    }

    fn position_of(&self, value: &T) -> Option<usize> {
        let stride = mem::size_of::<Slot<T, I>>();
        let base = self.slots.as_ptr() as usize;
        let offset = (value as *const T as usize).checked_sub(base)?;
        let position = offset / stride;
        if position < self.slots.len() {
            Some(position)
        } else {
            None
        }
    }

    pub fn iter(&self) -> Iter<'_, T, I> {
        Iter::new(&self.slots, self.len)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T, I> {
        IterMut::new(&mut self.slots, self.len)
    }

    pub fn values(&self) -> Values<'_, T, I> {
        Values::new(self.iter())
    }

    pub fn indices(&self) -> Indices<'_, T, I> {
        Indices::new(self.iter())
    }

    pub(crate) fn into_parts(self) -> (Vec<Slot<T, I>>, usize) {
        (self.slots, self.len)
    }

    /// Number of entries reachable from the free list head
    pub fn free_list_len(&self) -> Result<usize> {
        self.walk_free_list().map(|(count, _)| count)
    }

    /// Verify the free list against the slot array
    pub fn check_invariants(&self) -> Result<()> {
        let capacity = self.capacity();
        let expected = capacity.checked_sub(self.len).ok_or_else(|| {
            Error::CorruptFreeList(format!("len {} exceeds capacity {}", self.len, capacity))
        })?;

        let free_slots = self.slots.iter().filter(|slot| !slot.is_used()).count();
        if free_slots != expected {
            return Err(Error::CorruptFreeList(format!(
                "{} free slots, expected {}",
                free_slots, expected
            )));
        }

        let (walked, _) = self.walk_free_list()?;
        if walked != expected {
            return Err(Error::CorruptFreeList(format!(
                "free list holds {} entries, expected {}",
                walked, expected
            )));
        }
        Ok(())
    }

    /// Get statistics about the pool
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            len: self.len,
            capacity: self.capacity(),
            free: self.capacity() - self.len,
            block_size: self.block_size.get(),
            max_capacity: I::max_slots(),
        }
    }

    /// Count entries and find the tail of the free list
    fn walk_free_list(&self) -> Result<(usize, Option<I>)> {
        let mut count = 0;
        let mut tail = None;
        let mut current = self.free_head;

        while let Some(raw) = current {
            let position = raw.to_usize();
            let slot = self.slots.get(position).ok_or_else(|| {
                Error::CorruptFreeList(format!(
                    "link {} past capacity {}",
                    position,
                    self.slots.len()
                ))
            })?;
            if slot.kind() != SlotKind::Free {
                return Err(Error::CorruptFreeList(format!(
                    "slot {} is linked but not free",
                    position
                )));
            }

            count += 1;
            if count > self.slots.len() {
                return Err(Error::CorruptFreeList("cycle detected".to_string()));
            }
            tail = current;
            current = slot.next_free();
        }
        Ok((count, tail))
    }

    fn checked_position(&self, index: Index<I>) -> Result<usize> {
        let position = index.to_usize();
        if !index.is_valid() || position >= self.slots.len() {
            return Err(Error::OutOfRange {
                index: position,
                capacity: self.slots.len(),
            });
        }
        Ok(position)
    }

    fn put_on_free_list(&mut self, raw: I) {
        self.slots[raw.to_usize()] = Slot::free(self.free_head);
        self.free_head = Some(raw);
    }

    /// Pop the free list head
    fn pop_free(&mut self) -> Result<I> {
        let head = self
            .free_head
            .ok_or_else(|| Error::CorruptFreeList("no free slot after growth".to_string()))?;
        let position = head.to_usize();
        let slot = self.slots.get(position).ok_or_else(|| {
            Error::CorruptFreeList(format!(
                "head {} past capacity {}",
                position,
                self.slots.len()
            ))
        })?;
        if slot.kind() != SlotKind::Free {
            return Err(Error::CorruptFreeList(format!("head {} is not free", position)));
        }

        self.free_head = slot.next_free();
        Ok(head)
    }

    /// Append free slots up to `new_capacity`
    ///
    /// New slots are pushed in descending order so the lowest one is handed
    /// out first and insertion order matches iteration order. Storage must
    /// already be reserved.
    fn thread_new_slots(&mut self, new_capacity: usize) {
        let old_capacity = self.slots.len();
        self.slots.resize_with(new_capacity, || Slot::free(None));
        for position in (old_capacity..new_capacity).rev() {
            if let Some(raw) = I::from_usize(position) {
                self.put_on_free_list(raw);
            }
        }
    }

    fn reserve_slots(&mut self, new_capacity: usize) -> Result<()> {
        let additional = new_capacity.saturating_sub(self.slots.len());
        self.slots
            .try_reserve_exact(additional)
            .map_err(|e| Error::AllocationFailed {
                requested: new_capacity,
                reason: e.to_string(),
            })
    }
}

impl<T, P: GrowthPolicy, I: PoolIndex> CompactPool<T, P, I> {
    /// Create an empty pool growing according to `policy`
    pub fn with_policy(policy: P) -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            block_size: policy.first_block_size(),
            free_head: None,
            policy,
        }
    }

    /// Store `value`, returning its handle
    pub fn insert(&mut self, value: T) -> Result<Index<I>> {
        self.emplace_with(|_| value)
    }

    /// Store the record built by `make`, which receives the record's own
    /// handle
    pub fn emplace_with<F>(&mut self, make: F) -> Result<Index<I>>
    where
        F: FnOnce(Index<I>) -> T,
    {
        if self.free_head.is_none() {
            self.allocate_new_block()?;
        }
        let head = self
            .free_head
            .ok_or_else(|| Error::CorruptFreeList("no free slot after growth".to_string()))?;

        // The slot stays on the free list until the value exists
        let index = Index::new(head);
        let value = make(index);
        self.pop_free()?;
        self.slots[index.to_usize()] = Slot::Used(value);
        self.len += 1;

        trace!(%index, len = self.len, "inserted record");
        Ok(index)
    }

    /// Insert every item of `iter`
    pub fn try_extend<It: IntoIterator<Item = T>>(&mut self, iter: It) -> Result<()> {
        for value in iter {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Replace the contents with the items of `iter`
    pub fn assign<It: IntoIterator<Item = T>>(&mut self, iter: It) -> Result<()> {
        self.clear();
        self.try_extend(iter)
    }

    /// Grow by whole blocks until at least `capacity` slots exist
    ///
    /// All new slots are allocated at once and handed out in ascending order.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        let old_capacity = self.capacity();
        if old_capacity >= capacity {
            return Ok(());
        }

        let limit = I::max_slots();
        if capacity > limit {
            return Err(Error::CapacityOverflow {
                requested: capacity,
                limit,
            });
        }

        let (new_capacity, next_block) =
            grow_until(&self.policy, old_capacity, self.block_size, capacity, limit);
        self.reserve_slots(new_capacity)?;
        self.thread_new_slots(new_capacity);
        self.block_size = next_block;

        debug!(old_capacity, new_capacity, requested = capacity, "reserved slots");
        Ok(())
    }

    /// Drop every record and release the storage
    pub fn clear(&mut self) {
        let dropped = self.len;
        let released = self.capacity();

        self.slots = Vec::new();
        self.len = 0;
        self.free_head = None;
        self.block_size = self.policy.first_block_size();

        debug!(dropped, released, "cleared pool");
    }

    /// Move every slot of `other` after this pool's slots
    ///
    /// Returns the offset added to `other`'s handles: a record at `i` in
    /// `other` is at `offset + i` afterwards. `other` is left empty. The
    /// free lists are concatenated, this pool's first.
    pub fn merge(&mut self, other: &mut Self) -> Result<usize> {
        let offset = self.capacity();
        let limit = I::max_slots();
        let combined = offset
            .checked_add(other.capacity())
            .filter(|combined| *combined <= limit)
            .ok_or(Error::CapacityOverflow {
                requested: offset.saturating_add(other.capacity()),
                limit,
            })?;

        let (_, tail) = self.walk_free_list()?;
        self.reserve_slots(combined)?;

        let rebase = move |raw: I| I::from_usize(raw.to_usize() + offset);
        let other_head = other.free_head.and_then(rebase);
        for slot in mem::take(&mut other.slots) {
            let slot = match slot {
                Slot::Used(value) => Slot::Used(value),
                Slot::Free(word) => Slot::free(tag::word_link(word).and_then(rebase)),
            };
            self.slots.push(slot);
        }

        match tail {
            Some(tail) => self.slots[tail.to_usize()] = Slot::free(other_head),
            None => self.free_head = other_head,
        }
        self.len += other.len;
        self.block_size = self.block_size.max(other.block_size);

        let moved = other.len;
        other.clear();

        debug!(offset, moved, capacity = self.capacity(), "merged pools");
        Ok(offset)
    }

    fn allocate_new_block(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let limit = I::max_slots();
        if old_capacity >= limit {
            return Err(Error::CapacityOverflow {
                requested: old_capacity.saturating_add(self.block_size.get()),
                limit,
            });
        }

        let new_capacity = old_capacity.saturating_add(self.block_size.get()).min(limit);
        self.reserve_slots(new_capacity)?;
        self.thread_new_slots(new_capacity);
        self.block_size = self.policy.next_block_size(new_capacity, self.block_size);

        debug!(
            old_capacity,
            new_capacity,
            next_block = self.block_size.get(),
            "allocated new block"
        );
        Ok(())
    }
}

/// Copies are packed: live records are re-inserted in iteration order, so
/// handles of the copy may differ from the source's.
impl<T: Clone, P: GrowthPolicy + Clone, I: PoolIndex> Clone for CompactPool<T, P, I> {
    fn clone(&self) -> Self {
        let mut pool = Self::with_policy(self.policy.clone());

        let (capacity, block_size) =
            grow_until(&pool.policy, 0, pool.block_size, self.len, I::max_slots());
        pool.slots.reserve_exact(capacity);
        pool.slots.extend(self.values().cloned().map(Slot::Used));
        pool.len = self.len;
        pool.block_size = block_size;
        pool.thread_new_slots(capacity);
        pool
    }
}

impl<T: fmt::Debug, P, I: PoolIndex> fmt::Debug for CompactPool<T, P, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, P, I: PoolIndex> ops::Index<Index<I>> for CompactPool<T, P, I> {
    type Output = T;

    fn index(&self, index: Index<I>) -> &T {
        match self.try_get(index) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T, P, I: PoolIndex> ops::IndexMut<Index<I>> for CompactPool<T, P, I> {
    fn index_mut(&mut self, index: Index<I>) -> &mut T {
        match self.try_get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

/// Statistics for a compact pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub len: usize,
    pub capacity: usize,
    pub free: usize,
    pub block_size: usize,
    pub max_capacity: usize,
}
