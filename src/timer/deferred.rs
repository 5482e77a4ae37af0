//! Deferred short-duration callbacks.
//!
//! A min-heap of `(fire_at, sequence, action)` drained at the start of every
//! tick. Entries due at the same instant come out in scheduling order, so the
//! queue is fully deterministic for a given tick sequence.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
struct Entry<A> {
    fire_at: Duration,
    seq: u64,
    action: A,
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    // Reversed so the BinaryHeap pops the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Queue of actions to run once the encounter clock reaches their fire time.
#[derive(Debug)]
pub struct DeferredQueue<A> {
    heap: BinaryHeap<Entry<A>>,
    next_seq: u64,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<A> DeferredQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` once `now + delay` is reached.
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: A) {
        self.schedule_at(now + delay, action);
    }

    pub fn schedule_at(&mut self, fire_at: Duration, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            fire_at,
            seq,
            action,
        });
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<A> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|e| e.fire_at <= now) {
            if let Some(entry) = self.heap.pop() {
                due.push(entry.action);
            }
        }
        due
    }

    /// Fire time of the earliest pending action
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|e| e.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
