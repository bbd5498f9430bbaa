//! Settable, clearable completion signal
//!
//! This module provides `Event`, a binary flag that tasks can wait on until it
//! is set. [`Queue`](crate::Queue) uses one as the completion barrier behind
//! `join()`: it is cleared by every enqueue and set when the last unfinished
//! item is acknowledged.
//!
//! # Example
//!
//! ```rust,no_run
//! use compio_queue::Event;
//! use std::sync::Arc;
//!
//! #[compio::main]
//! async fn main() {
//!     let event = Arc::new(Event::new());
//!     let event_clone = event.clone();
//!
//!     // Spawn a task that waits for the signal
//!     let handle = compio::runtime::spawn(async move {
//!         event_clone.wait().await;
//!         println!("Signalled!");
//!     });
//!
//!     event.set();
//!     handle.await.unwrap();
//! }
//! ```

use parking_lot::Mutex;

use crate::waiter_queue::WaiterQueue;

/// A compio-compatible async event flag
///
/// Unlike a condition variable, the flag is sticky: once set, every `wait()`
/// returns immediately until `clear()` is called.
///
/// All tasks parked when the flag is set are released together. A task that
/// was released keeps its release even if the flag is cleared again before it
/// gets to run.
pub struct Event {
    inner: Mutex<EventInner>,
}

/// Flag and waiters live under one lock so that checking the flag and parking
/// happen atomically with respect to `set()`.
struct EventInner {
    /// `true` = set, waiters return immediately
    set: bool,

    waiters: WaiterQueue,
}

impl Event {
    /// Create a new event in the cleared state
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::Event;
    ///
    /// let event = Event::new();
    /// assert!(!event.is_set());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(false)
    }

    /// Create a new event that starts out set
    #[must_use]
    pub fn new_set() -> Self {
        Self::with_state(true)
    }

    fn with_state(set: bool) -> Self {
        Self {
            inner: Mutex::new(EventInner {
                set,
                waiters: WaiterQueue::new(),
            }),
        }
    }

    /// Whether the flag is currently set
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.inner.lock().set
    }

    /// Set the flag and release every waiting task
    ///
    /// Does nothing if the flag is already set.
    pub fn set(&self) {
        let mut inner = self.inner.lock();
        if inner.set {
            return;
        }
        inner.set = true;
        inner.waiters.wake_all();
    }

    /// Clear the flag
    ///
    /// Future calls to `wait()` will suspend until `set()` is called.
    pub fn clear(&self) {
        self.inner.lock().set = false;
    }

    /// Wait until the flag is set
    ///
    /// Returns immediately if it already is.
    ///
    /// # Example
    ///
    /// ```rust
    /// use compio_queue::Event;
    ///
    /// # #[compio::main]
    /// # async fn main() {
    /// let event = Event::new_set();
    /// event.wait().await;
    /// # }
    /// ```
    pub async fn wait(&self) {
        let waiter = {
            let mut inner = self.inner.lock();
            if inner.set {
                return;
            }
            inner.waiters.prune();
            inner.waiters.park()
        };

        // Only set() resolves event waiters, and dropping this future cancels
        waiter.wait().await;
    }

    /// Get the number of tasks waiting on this event
    ///
    /// This is useful for tests, debugging, and observability.
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.inner.lock().waiters.waiter_count()
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Event")
            .field("set", &inner.set)
            .field("waiters", &inner.waiters.waiter_count())
            .finish()
    }
}
