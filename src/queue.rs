//! Bounded async producer/consumer queue for compio runtime
//!
//! Provides a queue that lets cooperative tasks hand items to each other with
//! backpressure. Consumers suspend while the queue is empty, producers suspend
//! while a bounded queue is full, and `join()` waits until every enqueued item
//! has been acknowledged with `task_done()`.
//!
//! # Example
//!
//! ```rust,no_run
//! use compio_queue::Queue;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // At most 16 items buffered; producers wait beyond that
//! let queue = Arc::new(Queue::bounded(16));
//!
//! let worker = {
//!     let queue = queue.clone();
//!     compio::runtime::spawn(async move {
//!         loop {
//!             let path: String = queue.get().await;
//!             // Process the item...
//!             drop(path);
//!             queue.task_done().unwrap();
//!         }
//!     })
//! };
//!
//! for i in 0..100 {
//!     queue.put(format!("file-{i}")).await;
//! }
//!
//! // Returns once the worker acknowledged all 100 items
//! queue.join().await;
//! # drop(worker);
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Elapsed, PutTimeout, QueueEmpty, QueueFull, TooManyAcknowledgements};
use crate::event::Event;
use crate::storage::{RingBuffer, Storage};
use crate::waiter::{Outcome, Waiter};
use crate::waiter_queue::WaiterQueue;

/// A compio-compatible async queue with backpressure and a completion barrier
///
/// # Design
///
/// - **FIFO wakeup**: parked getters and parked putters each resume in the
///   order they parked
/// - **Handoff**: a producer that finds a parked consumer wakes it, and that
///   consumer is the one the item goes to
/// - **Bound**: storage never holds more than `max_capacity` items
/// - **Cancellation safe**: dropping a `get`/`put`/`join` future never loses
///   an item or a wakeup
/// - **Pluggable storage**: generic over [`Storage`]; [`Queue`] uses the FIFO
///   [`RingBuffer`]
///
/// Users should wrap in `Arc<Queue<T>>` when sharing between tasks.
pub struct QueueGeneric<S: Storage> {
    inner: Mutex<QueueInner<S>>,

    /// Completion signal: set iff `unfinished == 0`
    ///
    /// Only touched while `inner` is locked, so the two never disagree.
    finished: Event,
}

/// Public type alias using the FIFO ring storage
///
/// This is what users actually interact with. The generic implementation
/// allows other storage disciplines while this alias keeps the API simple.
pub type Queue<T> = QueueGeneric<RingBuffer<T>>;

/// Which waiter list a parked task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Getter,
    Putter,
}

/// Internal state, always accessed under the queue mutex
///
/// The mutex is never held across an `.await`. Under a cooperative scheduler
/// it is never contended; it only makes the queue shareable through `Arc`.
struct QueueInner<S: Storage> {
    storage: S,
    /// Tasks waiting for an item
    getters: WaiterQueue,
    /// Tasks waiting for free capacity
    putters: WaiterQueue,
    /// Items enqueued but not yet acknowledged with `task_done()`
    unfinished: usize,
}

impl<S: Storage> QueueInner<S> {
    fn is_full(&self) -> bool {
        let max = self.storage.max_capacity();
        max > 0 && self.storage.len() >= max
    }

    /// Dequeue one item and let the first live putter into the freed slot
    fn take(&mut self) -> Option<S::Item> {
        let item = self.storage.dequeue()?;
        if self.putters.wake_one() {
            assert!(
                self.storage.max_capacity() > 0,
                "putter was parked on an unbounded queue"
            );
            trace!(len = self.storage.len(), "woke parked putter");
        }
        Some(item)
    }

    /// Enqueue one item and wake the first live getter
    ///
    /// A parked getter does not bypass the capacity check: getters woken
    /// earlier may not have run yet, so storage can be full while another
    /// getter is still parked.
    fn offer(&mut self, item: S::Item) -> Result<(), QueueFull<S::Item>> {
        if self.is_full() {
            return Err(QueueFull(item));
        }

        self.storage.ensure_capacity();
        self.storage.enqueue(item);

        let max = self.storage.max_capacity();
        assert!(
            max == 0 || self.storage.len() <= max,
            "queue storage exceeded its bound"
        );

        self.unfinished += 1;
        if self.getters.wake_one() {
            trace!(len = self.storage.len(), "handed off to parked getter");
        }
        Ok(())
    }

    /// Park a new waiter on one side
    ///
    /// `resumed` is set for a task that was already woken once but lost the
    /// race for the item/slot; it goes back to the head of the line.
    fn park(&mut self, side: Side, resumed: bool) -> Waiter {
        let waiters = match side {
            Side::Getter => &mut self.getters,
            Side::Putter => &mut self.putters,
        };
        waiters.prune();
        let waiter = if resumed {
            waiters.park_front()
        } else {
            waiters.park()
        };
        trace!(?side, waiting = waiters.waiter_count(), "parked");
        waiter
    }
}

impl<S: Storage> QueueGeneric<S> {
    /// Create a new queue holding at most `max_capacity` items
    ///
    /// A `max_capacity` of 0 means unbounded: `put()` never suspends.
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::Queue;
    ///
    /// let queue = Queue::<u32>::new(10);
    /// assert_eq!(queue.max_capacity(), 10);
    /// assert!(queue.is_empty());
    /// ```
    #[must_use]
    pub fn new(max_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                storage: S::with_max_capacity(max_capacity),
                getters: WaiterQueue::new(),
                putters: WaiterQueue::new(),
                unfinished: 0,
            }),
            // Nothing outstanding yet
            finished: Event::new_set(),
        }
    }

    /// Create a queue without a capacity limit
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Create a queue that applies backpressure beyond `max_capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `max_capacity` is 0 (use [`unbounded`](Self::unbounded))
    #[must_use]
    pub fn bounded(max_capacity: usize) -> Self {
        assert!(max_capacity > 0, "Bounded queue must hold at least one item");
        Self::new(max_capacity)
    }

    /// Take an item or park as a getter, atomically
    fn get_or_park(&self, resumed: bool) -> Result<S::Item, Waiter> {
        let mut inner = self.inner.lock();
        match inner.take() {
            Some(item) => Ok(item),
            None => Err(inner.park(Side::Getter, resumed)),
        }
    }

    /// Store an item or park as a putter, atomically
    fn put_or_park(&self, item: S::Item, resumed: bool) -> Result<(), (S::Item, Waiter)> {
        let mut inner = self.inner.lock();
        match inner.offer(item) {
            Ok(()) => {
                self.finished.clear();
                Ok(())
            }
            Err(QueueFull(item)) => Err((item, inner.park(Side::Putter, resumed))),
        }
    }

    /// Remove and return the oldest item, waiting asynchronously if empty
    ///
    /// Getters are served in the order they started waiting.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use compio_queue::Queue;
    ///
    /// # async fn example() {
    /// let queue = Queue::unbounded();
    /// queue.put(7).await;
    /// assert_eq!(queue.get().await, 7);
    /// # }
    /// ```
    pub async fn get(&self) -> S::Item {
        let mut resumed = false;
        loop {
            match self.get_or_park(resumed) {
                Ok(item) => return item,
                // State seen before suspending is stale after it; loop re-checks
                Err(waiter) => resumed = Parked::new(self, waiter, Side::Getter).wait().await,
            }
        }
    }

    /// Remove and return the oldest item without waiting
    ///
    /// # Errors
    ///
    /// Returns [`QueueEmpty`] if no item is stored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::{Queue, QueueEmpty};
    ///
    /// let queue = Queue::unbounded();
    /// assert_eq!(queue.get_nowait(), Err(QueueEmpty));
    ///
    /// queue.put_nowait("a").unwrap();
    /// assert_eq!(queue.get_nowait(), Ok("a"));
    /// ```
    pub fn get_nowait(&self) -> Result<S::Item, QueueEmpty> {
        self.inner.lock().take().ok_or(QueueEmpty)
    }

    /// Add an item, waiting asynchronously while the queue is full
    ///
    /// Never waits on an unbounded queue. Putters are served in the order
    /// they started waiting. Dropping the future before it completes drops
    /// the item.
    pub async fn put(&self, item: S::Item) {
        let mut item = item;
        let mut resumed = false;
        loop {
            match self.put_or_park(item, resumed) {
                Ok(()) => return,
                Err((back, waiter)) => {
                    item = back;
                    resumed = Parked::new(self, waiter, Side::Putter).wait().await;
                }
            }
        }
    }

    /// Add an item without waiting
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] carrying the item if the queue is bounded and at
    /// capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::Queue;
    ///
    /// let queue = Queue::bounded(1);
    /// queue.put_nowait(1).unwrap();
    ///
    /// let rejected = queue.put_nowait(2).unwrap_err();
    /// assert_eq!(rejected.into_inner(), 2);
    /// ```
    pub fn put_nowait(&self, item: S::Item) -> Result<(), QueueFull<S::Item>> {
        let mut inner = self.inner.lock();
        inner.offer(item)?;
        self.finished.clear();
        Ok(())
    }

    /// Like [`get`](Self::get), giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`Elapsed`] if no item arrived in time. No item is consumed in
    /// that case.
    pub async fn get_timeout(&self, timeout: Duration) -> Result<S::Item, Elapsed> {
        compio::time::timeout(timeout, self.get())
            .await
            .map_err(|_| Elapsed)
    }

    /// Like [`put`](Self::put), giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`PutTimeout`] carrying the item if no capacity freed up in
    /// time.
    pub async fn put_timeout(
        &self,
        item: S::Item,
        timeout: Duration,
    ) -> Result<(), PutTimeout<S::Item>> {
        let deadline = Instant::now() + timeout;
        let mut item = item;
        let mut resumed = false;
        loop {
            let waiter = match self.put_or_park(item, resumed) {
                Ok(()) => return Ok(()),
                Err((back, waiter)) => {
                    item = back;
                    waiter
                }
            };

            // The item stays with us; only the parked waiter is timed
            let remaining = deadline.saturating_duration_since(Instant::now());
            let parked = Parked::new(self, waiter, Side::Putter);
            match compio::time::timeout(remaining, parked.wait()).await {
                Ok(notified) => resumed = notified,
                Err(_) => return Err(PutTimeout(item)),
            }
        }
    }

    /// Acknowledge that one dequeued item has been fully processed
    ///
    /// When the last unfinished item is acknowledged, every task waiting in
    /// [`join`](Self::join) is released.
    ///
    /// # Errors
    ///
    /// Returns [`TooManyAcknowledgements`] if called more times than items
    /// were enqueued. The counter is left untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::{Queue, TooManyAcknowledgements};
    ///
    /// let queue = Queue::unbounded();
    /// queue.put_nowait(1).unwrap();
    /// queue.get_nowait().unwrap();
    ///
    /// assert_eq!(queue.task_done(), Ok(()));
    /// assert_eq!(queue.task_done(), Err(TooManyAcknowledgements));
    /// ```
    pub fn task_done(&self) -> Result<(), TooManyAcknowledgements> {
        let mut inner = self.inner.lock();
        if inner.unfinished == 0 {
            tracing::debug!("task_done() called with no unfinished items");
            return Err(TooManyAcknowledgements);
        }
        inner.unfinished -= 1;
        if inner.unfinished == 0 {
            self.finished.set();
        }
        Ok(())
    }

    /// Wait until every enqueued item has been acknowledged
    ///
    /// Returns immediately if nothing is outstanding. All tasks waiting here
    /// are released together by the `task_done()` call that brings the count
    /// to zero.
    pub async fn join(&self) {
        self.finished.wait().await;
    }

    /// Like [`join`](Self::join), giving up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`Elapsed`] if items were still unfinished at the deadline.
    pub async fn join_timeout(&self, timeout: Duration) -> Result<(), Elapsed> {
        compio::time::timeout(timeout, self.join())
            .await
            .map_err(|_| Elapsed)
    }

    /// Number of items currently stored
    ///
    /// Point-in-time value, stable only until the next suspension point.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().storage.len()
    }

    /// Whether no item is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a `put_nowait()` would fail right now
    ///
    /// Always `false` for an unbounded queue.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.inner.lock().is_full()
    }

    /// Number of slots currently allocated by the storage
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().storage.capacity()
    }

    /// Configured bound, 0 when unbounded
    #[must_use]
    pub fn max_capacity(&self) -> usize {
        self.inner.lock().storage.max_capacity()
    }

    /// Number of enqueued items not yet acknowledged with `task_done()`
    #[must_use]
    pub fn unfinished_tasks(&self) -> usize {
        self.inner.lock().unfinished
    }

    /// Number of tasks suspended in `get()`
    ///
    /// This is useful for tests, debugging, and observability.
    #[must_use]
    pub fn waiting_getters(&self) -> usize {
        self.inner.lock().getters.waiter_count()
    }

    /// Number of tasks suspended in `put()`
    #[must_use]
    pub fn waiting_putters(&self) -> usize {
        self.inner.lock().putters.waiter_count()
    }

    /// Pass a wakeup on after the task it was meant for went away
    fn hand_over(&self, side: Side) {
        let mut inner = self.inner.lock();
        let passed = match side {
            Side::Getter => !inner.storage.is_empty() && inner.getters.wake_one(),
            Side::Putter => !inner.is_full() && inner.putters.wake_one(),
        };
        if passed {
            trace!(?side, "passed wakeup on from dropped waiter");
        }
    }
}

impl<S: Storage> Default for QueueGeneric<S> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<S: Storage> std::fmt::Debug for QueueGeneric<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Queue")
            .field("len", &inner.storage.len())
            .field("max_capacity", &inner.storage.max_capacity())
            .field("unfinished", &inner.unfinished)
            .field("getters", &inner.getters.waiter_count())
            .field("putters", &inner.putters.waiter_count())
            .finish()
    }
}

/// A task parked on one of the queue's waiter lists
///
/// If the task is dropped after the queue already picked it (resolved its
/// waiter) but before it ran, the wakeup would be lost; dropping the guard
/// passes it on to the next waiter on the same side.
struct Parked<'a, S: Storage> {
    queue: &'a QueueGeneric<S>,
    waiter: Waiter,
    side: Side,
    armed: bool,
}

impl<'a, S: Storage> Parked<'a, S> {
    fn new(queue: &'a QueueGeneric<S>, waiter: Waiter, side: Side) -> Self {
        Self {
            queue,
            waiter,
            side,
            armed: true,
        }
    }

    /// Suspend until resolved; `true` if the queue woke us
    async fn wait(mut self) -> bool {
        let outcome = self.waiter.wait().await;
        self.armed = false;
        outcome == Outcome::Notified
    }
}

impl<S: Storage> Drop for Parked<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Still pending: becomes a stale entry, pruned later
        if !self.waiter.cancel() && self.waiter.is_notified() {
            self.queue.hand_over(self.side);
        }
    }
}
