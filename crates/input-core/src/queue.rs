//! Multi-producer, single-consumer queue of pending changes.
//!
//! # How the drain works
//!
//! Producers send into a `std::sync::mpsc` channel and then bump a shared
//! atomic counter.  The owning thread drains by atomically swapping the
//! counter to zero: the value it gets back is exactly the number of items
//! that were fully pushed before the drain started, and those items are
//! already sitting in the channel.  The drain then takes that many items and
//! stops, so a producer that keeps pushing during the drain can never make it
//! run forever.  Its items are picked up by the next drain instead.
//!
//! Neither side ever waits for the other: a push is one channel send plus one
//! atomic add, and the drain only uses `try_recv`.
//!
//! The queue is generic so devices can keep a private one for their own
//! capture thread (see [`crate::devices::backend::ChannelBackend`]).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::domain::change::Change;

/// Consumer side, owned by whoever applies the changes.
#[derive(Debug)]
pub struct ChangeQueue<T = Change> {
    receiver: Receiver<T>,
    sender: Sender<T>,
    pending: Arc<AtomicUsize>,
}

/// Producer side.  Cheap to clone and safe to move to any thread.
#[derive(Debug)]
pub struct ChangeProducer<T = Change> {
    sender: Sender<T>,
    pending: Arc<AtomicUsize>,
}

// Manual impl: a derive would require `T: Clone`.
impl<T> Clone for ChangeProducer<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> ChangeProducer<T> {
    /// Enqueues `item` for the next drain.
    ///
    /// Returns `false` when the queue has been dropped; the item is discarded.
    pub fn push(&self, item: T) -> bool {
        if self.sender.send(item).is_err() {
            return false;
        }
        // Release pairs with the Acquire swap in `drain`: once the drain sees
        // this increment, the item is guaranteed to be in the channel.
        self.pending.fetch_add(1, Ordering::Release);
        true
    }
}

impl<T> ChangeQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            sender,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a new producer handle feeding this queue.
    pub fn producer(&self) -> ChangeProducer<T> {
        ChangeProducer {
            sender: self.sender.clone(),
            pending: Arc::clone(&self.pending),
        }
    }

    /// Enqueues from the owning thread.
    pub fn push(&self, item: T) {
        // The receiver lives in `self`, so this send cannot fail.
        if self.sender.send(item).is_ok() {
            self.pending.fetch_add(1, Ordering::Release);
        }
    }

    /// Number of items fully pushed and not yet drained.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Takes a snapshot of everything pushed since the last drain.
    ///
    /// The returned iterator is lazy and yields items in arrival order.  It
    /// ends after the snapshot count even if producers push more meanwhile.
    /// Dropping it early leaves the remaining items for the next drain.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let remaining = self.pending.swap(0, Ordering::Acquire);
        Drain {
            receiver: &self.receiver,
            pending: &self.pending,
            remaining,
        }
    }
}

impl<T> Default for ChangeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`ChangeQueue::drain`].
#[derive(Debug)]
pub struct Drain<'a, T> {
    receiver: &'a Receiver<T>,
    pending: &'a AtomicUsize,
    remaining: usize,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(item) => {
                self.remaining -= 1;
                Some(item)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        if self.remaining > 0 {
            self.pending.fetch_add(self.remaining, Ordering::Release);
        }
    }
}
