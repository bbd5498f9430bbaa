//! Error types returned by [`Queue`](crate::Queue) operations
//!
//! `QueueEmpty` and `QueueFull` are expected conditions that callers retry or
//! back off on. `TooManyAcknowledgements` is a usage error: `task_done()` was
//! called more times than items were enqueued.

use std::fmt;
use thiserror::Error;

/// `get_nowait()` found no item in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is empty")]
pub struct QueueEmpty;

/// `put_nowait()` found the bounded queue at capacity
///
/// The rejected item is handed back so the caller can retry without cloning.
#[derive(Clone, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    /// Take back the item that could not be enqueued
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueFull").finish_non_exhaustive()
    }
}

/// `task_done()` was called with no unfinished items outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task_done() called more times than items were enqueued")]
pub struct TooManyAcknowledgements;

/// A timed `get` or `join` did not complete before its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out")]
pub struct Elapsed;

/// A timed `put` did not find room before its deadline
///
/// Carries the item that was never enqueued.
#[derive(Clone, PartialEq, Eq, Error)]
#[error("put timed out waiting for free capacity")]
pub struct PutTimeout<T>(pub T);

impl<T> PutTimeout<T> {
    /// Take back the item that could not be enqueued
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for PutTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutTimeout").finish_non_exhaustive()
    }
}
