//! Bounded blocking queue
//!
//! Fixed-capacity FIFO with backpressure on the producer side.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::{Condvar, Mutex};

/// Returned by [`BoundedQueue::enqueue`] once the queue has been closed,
/// handing the rejected item back to the caller
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A fixed-capacity FIFO monitor
///
/// ## Concurrency:
/// - `enqueue` blocks while the queue is full, `dequeue` blocks while it is empty
/// - `not_full` is waited on by producers, `not_empty` by consumers
/// - A woken thread re-checks its predicate: another consumer may have
///   claimed the item the wakeup was for
/// - `close` wakes everybody; after it no item is handed out or accepted
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue holding at most `capacity` items
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");

        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Append `item` at the tail, blocking while the queue is full
    ///
    /// Wakes one blocked consumer.
    ///
    /// # Errors
    /// Returns the item inside [`QueueClosed`] if the queue is (or becomes,
    /// while waiting for room) closed.
    pub fn enqueue(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut inner = self.inner.lock();

        while inner.items.len() == self.capacity && !inner.closed {
            tracing::trace!("queue full ({}), producer waiting", self.capacity);
            self.not_full.wait(&mut inner);
        }

        if inner.closed {
            return Err(QueueClosed(item));
        }

        inner.items.push_back(item);
        drop(inner);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the head item, blocking while the queue is empty
    ///
    /// Wakes the blocked producer, if any. Returns `None` once the queue is
    /// closed, even if items were still pending.
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.inner.lock();

        while inner.items.is_empty() && !inner.closed {
            self.not_empty.wait(&mut inner);
        }

        if inner.closed {
            return None;
        }

        let item = inner.items.pop_front();
        drop(inner);

        self.not_full.notify_one();
        item
    }

    /// Close the queue and wake every blocked producer and consumer
    ///
    /// Returns the items that were still pending.
    pub fn close(&self) -> Vec<T> {
        let pending = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.items.drain(..).collect()
        };

        self.not_full.notify_all();
        self.not_empty.notify_all();
        pending
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Whether no item is queued
    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Fixed capacity given at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
