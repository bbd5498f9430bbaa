//! FIFO list of parked waiters
//!
//! This module provides the waiter bookkeeping shared by [`Queue`](crate::Queue)
//! (one list for getters, one for putters) and [`Event`](crate::Event).
//!
//! # Lazy pruning
//!
//! The list holds clones of [`Waiter`] handles whose lifetime belongs to the
//! parked future. When that future is dropped (timeout, `select!`, task abort)
//! the waiter resolves itself as cancelled but stays in the list. Every
//! operation that looks at the head first drops such stale entries, so a
//! cancelled waiter never blocks the line.
//!
//! Entries cancelled behind a live head are swept out when parking, once the
//! list has doubled since the last sweep, so repeated timeouts cannot grow it
//! without bound.
//!
//! # Locking
//!
//! `WaiterQueue` has no lock of its own. Owners keep it inside the same
//! mutex as the state the waiters are waiting on, so checking the condition and
//! parking happen in one critical section.

use std::collections::VecDeque;

use tracing::trace;

use crate::waiter::Waiter;

/// List length below which parking never sweeps
const SWEEP_THRESHOLD: usize = 32;

/// Ordered sequence of parked waiters
#[derive(Debug)]
pub struct WaiterQueue {
    /// Earliest parked at the front
    waiters: VecDeque<Waiter>,
    /// Length at which the next park sweeps resolved entries
    sweep_at: usize,
}

impl WaiterQueue {
    /// Create a new empty waiter queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }

    /// Drop resolved entries anywhere in the list once it has doubled
    fn sweep(&mut self) {
        if self.waiters.len() < self.sweep_at {
            return;
        }
        let before = self.waiters.len();
        self.waiters.retain(|w| !w.is_resolved());
        self.sweep_at = SWEEP_THRESHOLD.max(self.waiters.len() * 2);
        trace!(swept = before - self.waiters.len(), "swept stale waiters");
    }

    /// Append a fresh waiter at the back and return the caller's handle
    pub fn park(&mut self) -> Waiter {
        self.sweep();
        let waiter = Waiter::new();
        self.waiters.push_back(waiter.clone());
        waiter
    }

    /// Insert a fresh waiter at the front
    ///
    /// Used by a task that was woken but lost its turn to another task and has
    /// to wait again without giving up its place in line.
    pub fn park_front(&mut self) -> Waiter {
        self.sweep();
        let waiter = Waiter::new();
        self.waiters.push_front(waiter.clone());
        waiter
    }

    /// Drop resolved entries from the head, returning how many were removed
    pub fn prune(&mut self) -> usize {
        let mut pruned = 0;
        while self.waiters.front().is_some_and(Waiter::is_resolved) {
            self.waiters.pop_front();
            pruned += 1;
        }
        if pruned > 0 {
            trace!(pruned, "pruned stale waiters");
        }
        pruned
    }

    /// Whether no live waiter is at the head (after pruning)
    pub fn is_empty(&mut self) -> bool {
        self.prune();
        self.waiters.is_empty()
    }

    /// Resolve the earliest live waiter
    ///
    /// Returns `true` if a task was woken.
    pub fn wake_one(&mut self) -> bool {
        while let Some(waiter) = self.waiters.pop_front() {
            // Fails only for entries that resolved out-of-band
            if waiter.resolve() {
                return true;
            }
        }
        false
    }

    /// Resolve every live waiter, returning how many were woken
    pub fn wake_all(&mut self) -> usize {
        std::mem::take(&mut self.waiters)
            .into_iter()
            .filter(Waiter::resolve)
            .count()
    }

    /// Number of live (unresolved) waiters
    #[must_use]
    pub fn waiter_count(&self) -> usize {
        self.waiters.iter().filter(|w| !w.is_resolved()).count()
    }
}

impl Default for WaiterQueue {
    fn default() -> Self {
        Self::new()
    }
}
