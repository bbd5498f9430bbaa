//! Growable FIFO circular buffer
//!
//! Performance characteristics:
//! - Enqueue/dequeue: O(1), amortized O(1) when enqueue triggers growth
//! - Growth doubles the slot count (minimum 8), clamped to the bound
//! - Never shrinks

use std::cmp;

use tracing::debug;

use super::Storage;

/// Slot count of the first allocation
const MIN_CAPACITY: usize = 8;

/// FIFO ring storage
///
/// The occupied region starts at `start` and spans `len` slots, wrapping
/// around the end of `slots`. Empty slots hold `None` so a dequeued item is
/// released immediately rather than when its slot is overwritten.
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Physical index of the oldest item, `< slots.len()` whenever slots exist
    start: usize,
    len: usize,
    /// 0 = unbounded
    max_capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty ring with no slots allocated
    #[must_use]
    pub fn new(max_capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            start: 0,
            len: 0,
            max_capacity,
        }
    }

    #[inline]
    fn physical(&self, offset: usize) -> usize {
        (self.start + offset) % self.slots.len()
    }

    /// Iterate from oldest to newest without removing anything
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ring: self,
            offset: 0,
        }
    }
}

impl<T> Storage for RingBuffer<T> {
    type Item = T;

    fn with_max_capacity(max_capacity: usize) -> Self {
        Self::new(max_capacity)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn ensure_capacity(&mut self) {
        let old = self.slots.len();
        if self.len < old {
            return;
        }

        let mut new = cmp::max(MIN_CAPACITY, 2 * self.len);
        if self.max_capacity > 0 {
            new = cmp::min(new, self.max_capacity);
        }
        debug_assert!(new > old, "ensure_capacity called on a full bounded ring");
        if new <= old {
            return;
        }

        // Move the oldest item to index 0 so the occupied region is contiguous
        // and the new slots simply extend it.
        self.slots.rotate_left(self.start);
        self.start = 0;

        if self.max_capacity == 0 {
            // Use whatever the allocator handed out
            self.slots.reserve(new - old);
            new = self.slots.capacity();
        }
        self.slots.resize_with(new, || None);

        debug!(from = old, to = new, "grew ring storage");
    }

    fn enqueue(&mut self, item: T) {
        debug_assert!(self.len < self.slots.len(), "enqueue without capacity");
        let index = self.physical(self.len);
        self.slots[index] = Some(item);
        self.len += 1;
    }

    fn dequeue(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.start].take();
        self.start = (self.start + 1) % self.slots.len();
        self.len -= 1;
        item
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over a [`RingBuffer`], oldest first
pub struct Iter<'a, T> {
    ring: &'a RingBuffer<T>,
    offset: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.offset >= self.ring.len {
            return None;
        }
        let index = self.ring.physical(self.offset);
        self.offset += 1;
        self.ring.slots[index].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ring.len - self.offset;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
