//! Async producer/consumer queue for compio runtime
//!
//! This crate provides a bounded FIFO [`Queue`] for cooperative tasks:
//!
//! - **Backpressure**: `put()` waits while a bounded queue is full, `get()`
//!   waits while it is empty
//! - **Fairness**: blocked producers and consumers resume in FIFO order
//! - **Completion barrier**: `join()` waits until every enqueued item was
//!   acknowledged with `task_done()`
//!
//! The building blocks are public as well: [`Waiter`] (single-assignment
//! suspension handle), [`WaiterQueue`] (FIFO of parked waiters with lazy
//! pruning) and [`Event`] (settable/clearable signal).
//!
//! # Example
//!
//! ```rust,no_run
//! use compio_queue::Queue;
//! use std::sync::Arc;
//!
//! #[compio::main]
//! async fn main() {
//!     let queue = Arc::new(Queue::bounded(8));
//!
//!     let consumer = {
//!         let queue = queue.clone();
//!         compio::runtime::spawn(async move {
//!             let mut sum = 0;
//!             for _ in 0..100 {
//!                 sum += queue.get().await;
//!                 queue.task_done().unwrap();
//!             }
//!             sum
//!         })
//!     };
//!
//!     for i in 0..100 {
//!         queue.put(i).await;
//!     }
//!     queue.join().await;
//!
//!     assert_eq!(consumer.await.unwrap(), 4950);
//! }
//! ```
//!
//! # Scheduling model
//!
//! The queue is designed for a single-threaded cooperative executor such as
//! compio's. `get`, `put` and `join` are the only operations that suspend;
//! everything else completes without yielding. Cancelling a suspended
//! operation is done by dropping its future (directly, through
//! `compio::time::timeout`, or through the `*_timeout` helpers).

pub mod error;
pub mod event;
pub mod queue;
pub mod storage;
pub mod waiter;
pub mod waiter_queue;

pub use error::{Elapsed, PutTimeout, QueueEmpty, QueueFull, TooManyAcknowledgements};
pub use event::Event;
pub use queue::{Queue, QueueGeneric};
pub use storage::{RingBuffer, Storage};
pub use waiter::{Outcome, Wait, Waiter};
pub use waiter_queue::WaiterQueue;
