//! Priority queues for graph traversal.
//!
//! [`NearestQueue`] is a plain min-heap of `(id, distance)` pairs used as a
//! search frontier and as the working set of the selection heuristics.
//! [`BoundedNearest`] keeps only the `bound` nearest entries seen so far by
//! evicting its current worst, which is exactly the result buffer a layer
//! search needs.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A `(distance, id)` pair with a total order: distance first, then id.
///
/// The id tie-break keeps heap order deterministic under a seeded run.
/// Callers must not depend on any particular order among equal-distance
/// entries beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    distance: OrderedFloat<f64>,
    id: u64,
}

impl Entry {
    fn new(id: u64, distance: f64) -> Self {
        Self {
            distance: OrderedFloat(distance),
            id,
        }
    }
}

/// Min-heap of `(id, distance)` pairs: `pop` yields the nearest entry.
#[derive(Debug, Default)]
pub struct NearestQueue {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl NearestQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Adds an entry. Duplicate ids are allowed; deduplication is the
    /// caller's concern.
    pub fn push(&mut self, id: u64, distance: f64) {
        self.heap.push(Reverse(Entry::new(id, distance)));
    }

    /// Removes and returns the nearest entry.
    pub fn pop(&mut self) -> Option<(u64, f64)> {
        self.heap.pop().map(|Reverse(e)| (e.id, e.distance.0))
    }

    /// Returns the nearest entry without removing it.
    pub fn peek(&self) -> Option<(u64, f64)> {
        self.heap.peek().map(|Reverse(e)| (e.id, e.distance.0))
    }

    /// Number of entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` when the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Returns `true` when an entry with this id is present. Linear scan.
    pub fn contains(&self, id: u64) -> bool {
        self.heap.iter().any(|Reverse(e)| e.id == id)
    }

    /// Re-keys the first entry found with this id and restores heap order.
    /// Returns `false` when the id is not present. Linear.
    pub fn update(&mut self, id: u64, distance: f64) -> bool {
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        let mut found = false;
        for Reverse(entry) in entries.iter_mut() {
            if entry.id == id {
                entry.distance = OrderedFloat(distance);
                found = true;
                break;
            }
        }
        self.heap = entries.into();
        found
    }
}

/// Keeps the `bound` nearest entries seen so far.
///
/// Backed by a max-heap so the current worst sits on top and is evicted
/// when a push exceeds the bound.
#[derive(Debug)]
pub struct BoundedNearest {
    heap: BinaryHeap<Entry>,
    bound: usize,
}

impl BoundedNearest {
    /// Creates a buffer retaining at most `bound` entries.
    ///
    /// A zero bound retains nothing: every push is evicted immediately and
    /// `at_capacity` is always `true`. Callers that need at least one
    /// result must pass a positive bound.
    pub fn new(bound: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(bound + 1),
            bound,
        }
    }

    /// Adds an entry, evicting the current worst if the bound is exceeded.
    pub fn push(&mut self, id: u64, distance: f64) {
        self.heap.push(Entry::new(id, distance));
        if self.heap.len() > self.bound {
            self.heap.pop();
        }
    }

    /// Distance of the current worst retained entry.
    pub fn worst(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.distance.0)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` when no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` once the buffer holds `bound` entries.
    pub fn at_capacity(&self) -> bool {
        self.heap.len() >= self.bound
    }

    /// Drains into `(id, distance)` pairs, nearest first.
    pub fn into_sorted_vec(self) -> Vec<(u64, f64)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.id, e.distance.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_queue_orders_by_distance() {
        let mut q = NearestQueue::new();
        q.push(1, 3.0);
        q.push(2, 1.0);
        q.push(3, 2.0);
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some((2, 1.0)));
        assert_eq!(q.pop(), Some((3, 2.0)));
        assert_eq!(q.pop(), Some((1, 3.0)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_nearest_queue_peek_does_not_remove() {
        let mut q = NearestQueue::new();
        q.push(7, 0.5);
        assert_eq!(q.peek(), Some((7, 0.5)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_nearest_queue_clear() {
        let mut q = NearestQueue::new();
        q.push(1, 1.0);
        q.push(2, 2.0);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_nearest_queue_update_rekeys() {
        let mut q = NearestQueue::new();
        q.push(1, 5.0);
        q.push(2, 1.0);
        assert!(q.update(1, 0.1));
        assert_eq!(q.pop(), Some((1, 0.1)));
        assert_eq!(q.pop(), Some((2, 1.0)));
    }

    #[test]
    fn test_nearest_queue_update_missing_id() {
        let mut q = NearestQueue::new();
        q.push(1, 1.0);
        assert!(!q.update(99, 0.0));
        assert_eq!(q.pop(), Some((1, 1.0)));
    }

    #[test]
    fn test_nearest_queue_contains() {
        let mut q = NearestQueue::new();
        q.push(4, 2.0);
        assert!(q.contains(4));
        assert!(!q.contains(5));
    }

    #[test]
    fn test_bounded_nearest_evicts_worst() {
        let mut b = BoundedNearest::new(2);
        b.push(1, 3.0);
        b.push(2, 1.0);
        b.push(3, 2.0);
        assert_eq!(b.len(), 2);
        assert_eq!(b.into_sorted_vec(), vec![(2, 1.0), (3, 2.0)]);
    }

    #[test]
    fn test_bounded_nearest_worst_tracks_top() {
        let mut b = BoundedNearest::new(2);
        assert_eq!(b.worst(), None);
        b.push(1, 3.0);
        assert_eq!(b.worst(), Some(3.0));
        b.push(2, 1.0);
        assert_eq!(b.worst(), Some(3.0));
        b.push(3, 2.0);
        assert_eq!(b.worst(), Some(2.0));
    }

    #[test]
    fn test_bounded_nearest_at_capacity() {
        let mut b = BoundedNearest::new(1);
        assert!(!b.at_capacity());
        b.push(1, 1.0);
        assert!(b.at_capacity());
    }

    #[test]
    fn test_bounded_nearest_zero_bound_retains_nothing() {
        let mut b = BoundedNearest::new(0);
        assert!(b.at_capacity());
        b.push(1, 1.0);
        assert!(b.is_empty());
        assert_eq!(b.worst(), None);
        assert!(b.into_sorted_vec().is_empty());
    }

    #[test]
    fn test_bounded_nearest_sorted_output() {
        let mut b = BoundedNearest::new(5);
        for (id, d) in [(1, 0.9), (2, 0.1), (3, 0.5), (4, 0.3)] {
            b.push(id, d);
        }
        let out = b.into_sorted_vec();
        let distances: Vec<f64> = out.iter().map(|&(_, d)| d).collect();
        assert_eq!(distances, vec![0.1, 0.3, 0.5, 0.9]);
    }
}
