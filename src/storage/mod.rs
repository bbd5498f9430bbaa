//! Item storage behind the queue
//!
//! The queue's get/put coordination is written once against the [`Storage`]
//! trait. A storage implementation decides the insertion and extraction
//! discipline (which item `dequeue` returns) and how it grows:
//!
//! - [`RingBuffer`]: FIFO circular buffer, the discipline behind [`Queue`](crate::Queue)
//!
//! Other disciplines (priority order, most-recent-first) plug in by
//! implementing the trait and using [`QueueGeneric`](crate::QueueGeneric)
//! directly.

mod ring;

pub use ring::{Iter, RingBuffer};

/// Trait for queue storage implementations
///
/// Implementations only store items; they never suspend and never see the
/// waiter lists. The queue calls [`ensure_capacity`](Storage::ensure_capacity)
/// before every [`enqueue`](Storage::enqueue) and only when
/// `len() < max_capacity()` on a bounded storage.
pub trait Storage {
    /// Type of the stored items
    type Item;

    /// Create empty storage. `max_capacity == 0` means unbounded.
    fn with_max_capacity(max_capacity: usize) -> Self;

    /// Number of stored items
    fn len(&self) -> usize;

    /// Whether no item is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots currently allocated
    fn capacity(&self) -> usize;

    /// Configured bound, 0 when unbounded
    fn max_capacity(&self) -> usize;

    /// Make room for one more item
    fn ensure_capacity(&mut self);

    /// Store an item. Room must already have been ensured.
    fn enqueue(&mut self, item: Self::Item);

    /// Remove the next item according to the storage's discipline
    fn dequeue(&mut self) -> Option<Self::Item>;
}
