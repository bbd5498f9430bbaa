//! Single-assignment suspension handle
//!
//! A [`Waiter`] parks one task and later resumes it exactly once, either because
//! another task resolved it ([`Outcome::Notified`]) or because it was resolved
//! out-of-band ([`Outcome::Cancelled`]), typically when the parked future was
//! dropped by a timeout or a `select!`.
//!
//! The handle carries no payload. Resolution only unblocks the parked task,
//! which then re-reads whatever shared state it was waiting on.
//!
//! # Example
//!
//! ```rust
//! use compio_queue::{Outcome, Waiter};
//!
//! # #[compio::main]
//! # async fn main() {
//! let waiter = Waiter::new();
//! let handle = waiter.clone();
//!
//! assert!(handle.resolve());
//! assert_eq!(waiter.wait().await, Outcome::Notified);
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use atomic_waker::AtomicWaker;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Resolution state stored in the waiter's atomic
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
enum State {
    /// Parked, nobody has resolved it yet
    Pending = 0,
    /// Resolved by the owner of the waiter list
    Notified = 1,
    /// Resolved out-of-band (dropped, timed out)
    Cancelled = 2,
}

/// How a parked task was resumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Another task resolved the waiter
    Notified,
    /// The waiter was cancelled before anyone resolved it
    Cancelled,
}

struct WaiterInner {
    state: AtomicU8,
    waker: AtomicWaker,
}

/// Shared, single-assignment handle used to park a task
///
/// Clones refer to the same waiter: one clone sits in a waiter list while the
/// parked task awaits another. The first of [`resolve`](Waiter::resolve) or
/// [`cancel`](Waiter::cancel) wins; later calls are no-ops.
#[derive(Clone)]
pub struct Waiter {
    inner: Arc<WaiterInner>,
}

impl Waiter {
    /// Create a new unresolved waiter
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(WaiterInner {
                state: AtomicU8::new(State::Pending.into()),
                waker: AtomicWaker::new(),
            }),
        }
    }

    #[inline]
    fn load_state(&self) -> State {
        // Only State values are ever stored
        State::try_from(self.inner.state.load(Ordering::Acquire)).unwrap_or(State::Cancelled)
    }

    /// Transition out of `Pending`, waking the parked task on success
    fn transition(&self, to: State) -> bool {
        let won = self
            .inner
            .state
            .compare_exchange(
                State::Pending.into(),
                to.into(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            self.inner.waker.wake();
        }
        won
    }

    /// Whether the waiter has been resolved by either path
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.load_state() != State::Pending
    }

    /// Whether the waiter was resolved with [`Outcome::Notified`]
    #[must_use]
    pub fn is_notified(&self) -> bool {
        self.load_state() == State::Notified
    }

    /// Whether the waiter was resolved with [`Outcome::Cancelled`]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.load_state() == State::Cancelled
    }

    /// Resolve the waiter and wake the parked task
    ///
    /// Returns `false` if the waiter was already resolved (for instance the
    /// parked task gave up first), in which case nobody was woken.
    pub fn resolve(&self) -> bool {
        self.transition(State::Notified)
    }

    /// Resolve the waiter out-of-band
    ///
    /// Returns `false` if it was already resolved.
    pub fn cancel(&self) -> bool {
        self.transition(State::Cancelled)
    }

    /// The resolution, if any
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.load_state() {
            State::Pending => None,
            State::Notified => Some(Outcome::Notified),
            State::Cancelled => Some(Outcome::Cancelled),
        }
    }

    /// Suspend until the waiter is resolved
    ///
    /// Dropping the returned future before it completes cancels the waiter, so
    /// whoever holds it in a list sees it as resolved and skips it.
    pub fn wait(&self) -> Wait<'_> {
        Wait { waiter: self }
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Waiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("state", &self.load_state())
            .finish()
    }
}

/// Future returned by [`Waiter::wait`]
#[must_use = "futures do nothing unless polled"]
pub struct Wait<'a> {
    waiter: &'a Waiter,
}

impl Future for Wait<'_> {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        if let Some(outcome) = self.waiter.outcome() {
            return Poll::Ready(outcome);
        }

        self.waiter.inner.waker.register(cx.waker());

        // Re-check after registration to prevent a lost wake
        match self.waiter.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl Drop for Wait<'_> {
    fn drop(&mut self) {
        // No-op when already resolved
        self.waiter.cancel();
    }
}
