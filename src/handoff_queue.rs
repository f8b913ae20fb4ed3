//! Bounded blocking FIFO used to hand payloads to the connection worker.
//!
//! Producers push from any thread. The consumer inspects the head with
//! [`HandoffQueue::peek`] and only removes it once the payload has been fully
//! written, so an interrupted send never loses the message.

use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Returned by [`HandoffQueue::push`] when the queue is at capacity.
///
/// The rejected item is handed back so the caller decides what to drop.
#[derive(Error, PartialEq, Eq)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> QueueFull<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

pub struct HandoffQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> HandoffQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            available: Condvar::new(),
            capacity,
        }
    }

    /// Append `item` at the tail, or hand it back if the queue is full.
    pub fn push(&self, item: T) -> Result<(), QueueFull<T>> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(QueueFull(item));
        }
        items.push_back(item);
        drop(items);
        self.available.notify_one();
        Ok(())
    }

    /// Remove and return the head without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Remove and return the head, waiting up to `timeout` for one to arrive.
    pub fn wait_and_pop(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        while items.is_empty() {
            if self.available.wait_until(&mut items, deadline).timed_out() {
                break;
            }
        }
        items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> HandoffQueue<T> {
    /// Return a copy of the head without removing it, waiting up to `timeout`.
    pub fn peek(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        while items.is_empty() {
            if self.available.wait_until(&mut items, deadline).timed_out() {
                break;
            }
        }
        items.front().cloned()
    }
}

impl<T> fmt::Debug for HandoffQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
