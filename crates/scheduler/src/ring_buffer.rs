//! Fixed-capacity FIFO ring buffer shared between producers and workers.
//!
//! [`BoundedQueue`] never grows and never blocks: a push into a full buffer
//! applies an [`OverflowPolicy`], and a pop from an empty buffer returns
//! `None` immediately. Callers that want to wait for work poll.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// What a full buffer does with an incoming element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Advance the read cursor to admit the new element, discarding the
    /// oldest unconsumed one.
    #[default]
    ReplaceOldest,
    /// Reject the incoming element and leave the buffer unchanged.
    DiscardNew,
}

/// Result of a push. Displaced elements are handed back to the caller;
/// dropping them is what "discard" means.
#[derive(Debug)]
#[must_use]
pub enum PushOutcome<T> {
    Stored,
    /// The buffer was full; the oldest element was removed to make room.
    Evicted(T),
    /// The buffer was full; the pushed element was not stored.
    Rejected(T),
}

impl<T> PushOutcome<T> {
    pub fn is_stored(&self) -> bool {
        !matches!(self, PushOutcome::Rejected(_))
    }

    /// The element that did not end up in the buffer, if any.
    pub fn into_displaced(self) -> Option<T> {
        match self {
            PushOutcome::Stored => None,
            PushOutcome::Evicted(item) | PushOutcome::Rejected(item) => Some(item),
        }
    }
}

/// Circular storage with one spare slot so that `read == write` always means
/// empty and `next(write) == read` always means full.
struct Ring<T> {
    slots: Box<[Option<T>]>,
    read: usize,
    write: usize,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        let slots = (0..=capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        Self { slots, read: 0, write: 0 }
    }

    fn next(&self, index: usize) -> usize {
        if index + 1 == self.slots.len() { 0 } else { index + 1 }
    }

    fn is_empty(&self) -> bool {
        self.read == self.write
    }

    fn is_full(&self) -> bool {
        self.next(self.write) == self.read
    }

    fn len(&self) -> usize {
        (self.write + self.slots.len() - self.read) % self.slots.len()
    }

    fn store(&mut self, item: T) {
        self.slots[self.write] = Some(item);
        self.write = self.next(self.write);
    }

    fn take_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.read].take();
        self.read = self.next(self.read);
        item
    }
}

/// Thread-safe bounded FIFO with a configurable overflow policy.
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`BoundedQueue::try_new`] for
    /// capacities that come from configuration.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        assert!(capacity > 0, "BoundedQueue capacity must be non-zero");
        Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            capacity,
            policy,
        }
    }

    pub fn try_new(capacity: usize, policy: OverflowPolicy) -> Result<Self, SchedulerError> {
        if capacity == 0 {
            return Err(SchedulerError::InvalidCapacity);
        }
        Ok(Self::new(capacity, policy))
    }

    /// Push using the queue's default overflow policy.
    pub fn push(&self, item: T) -> PushOutcome<T> {
        self.push_with(item, self.policy)
    }

    pub fn push_with(&self, item: T, policy: OverflowPolicy) -> PushOutcome<T> {
        let mut ring = self.lock();
        if !ring.is_full() {
            ring.store(item);
            return PushOutcome::Stored;
        }
        match policy {
            OverflowPolicy::DiscardNew => PushOutcome::Rejected(item),
            OverflowPolicy::ReplaceOldest => {
                let oldest = ring.take_front();
                ring.store(item);
                oldest.map_or(PushOutcome::Stored, PushOutcome::Evicted)
            }
        }
    }

    /// Remove the element at the read cursor. Never blocks.
    pub fn pop(&self) -> Option<T> {
        self.lock().take_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    // A panic while holding the lock cannot leave the cursors half-updated:
    // every mutation is a single store followed by a cursor bump.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn drain<T>(queue: &BoundedQueue<T>) -> Vec<T> {
        std::iter::from_fn(|| queue.pop()).collect()
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(4, OverflowPolicy::DiscardNew);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn fifo_order() {
        let queue = BoundedQueue::new(4, OverflowPolicy::DiscardNew);
        for i in 1..=3 {
            assert!(queue.push(i).is_stored());
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&queue), vec![1, 2, 3]);
    }

    #[test]
    fn holds_exactly_capacity_elements() {
        let queue = BoundedQueue::new(3, OverflowPolicy::DiscardNew);
        for i in 1..=3 {
            assert!(matches!(queue.push(i), PushOutcome::Stored));
        }
        assert!(queue.is_full());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn replace_oldest_pops_the_oldest_resident_element() {
        let capacity = 3;
        let queue = BoundedQueue::new(capacity, OverflowPolicy::ReplaceOldest);
        let pushes = 7;
        for i in 1..=pushes {
            let _ = queue.push(i);
        }
        // (push_count - C + 1)-th pushed element
        assert_eq!(queue.pop(), Some(pushes - capacity + 1));
        assert_eq!(drain(&queue), vec![6, 7]);
    }

    #[test]
    fn replace_oldest_hands_back_evicted_element() {
        let queue = BoundedQueue::new(2, OverflowPolicy::ReplaceOldest);
        let _ = queue.push("a");
        let _ = queue.push("b");
        match queue.push("c") {
            PushOutcome::Evicted(old) => assert_eq!(old, "a"),
            other => panic!("expected eviction, got {other:?}"),
        }
        assert_eq!(drain(&queue), vec!["b", "c"]);
    }

    #[test]
    fn discard_new_leaves_contents_unchanged() {
        let queue = BoundedQueue::new(3, OverflowPolicy::DiscardNew);
        for i in 1..=3 {
            let _ = queue.push(i);
        }
        match queue.push(4) {
            PushOutcome::Rejected(item) => assert_eq!(item, 4),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(drain(&queue), vec![1, 2, 3]);
    }

    #[test]
    fn per_push_policy_overrides_default() {
        let queue = BoundedQueue::new(1, OverflowPolicy::ReplaceOldest);
        let _ = queue.push(1);
        let outcome = queue.push_with(2, OverflowPolicy::DiscardNew);
        assert_eq!(outcome.into_displaced(), Some(2));
        assert_eq!(queue.pop(), Some(1));
    }

    #[test]
    fn cursors_wrap_around() {
        let queue = BoundedQueue::new(2, OverflowPolicy::DiscardNew);
        for round in 0..10 {
            let _ = queue.push(round * 2);
            let _ = queue.push(round * 2 + 1);
            assert_eq!(queue.pop(), Some(round * 2));
            assert_eq!(queue.pop(), Some(round * 2 + 1));
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result: Result<BoundedQueue<u8>, _> = BoundedQueue::try_new(0, OverflowPolicy::DiscardNew);
        assert!(matches!(result, Err(SchedulerError::InvalidCapacity)));
    }

    #[test]
    fn concurrent_producers_and_consumers_lose_nothing() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 2_000;
        // Small enough that producers regularly hit a full buffer while
        // consumers are popping.
        let queue = Arc::new(BoundedQueue::new(16, OverflowPolicy::DiscardNew));
        let producers_done = Arc::new(AtomicBool::new(false));

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let producers_done = Arc::clone(&producers_done);
                thread::spawn(move || {
                    let mut popped = Vec::new();
                    loop {
                        let finished = producers_done.load(Ordering::Acquire);
                        match queue.pop() {
                            Some(item) => popped.push(item),
                            None if finished => break,
                            None => thread::yield_now(),
                        }
                    }
                    popped
                })
            })
            .collect();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        let mut item = p * PER_PRODUCER + i;
                        while let PushOutcome::Rejected(back) = queue.push(item) {
                            item = back;
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        producers_done.store(true, Ordering::Release);

        let mut seen = HashSet::new();
        for consumer in consumers {
            let popped = consumer.join().unwrap();
            // Per producer, one consumer sees items in push order.
            let mut last = vec![None; PRODUCERS];
            for item in popped {
                let producer = item / PER_PRODUCER;
                assert!(last[producer].map_or(true, |prev| prev < item), "item {item} out of order");
                last[producer] = Some(item);
                assert!(seen.insert(item), "item {item} popped twice");
            }
        }
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        assert!(queue.is_empty());
    }
}
