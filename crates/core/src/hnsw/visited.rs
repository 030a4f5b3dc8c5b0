//! Visited-id set for HNSW graph traversal.
//!
//! Ids are client-supplied and sparse, so the set is hash-backed rather
//! than a dense generation array.

use std::collections::HashSet;

/// Records which node ids a traversal has already expanded.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<u64>,
}

impl VisitedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set sized for roughly `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Marks `id` as visited. Returns `true` if it was NOT previously
    /// visited (i.e. newly inserted).
    #[inline]
    pub fn insert(&mut self, id: u64) -> bool {
        self.seen.insert(id)
    }

    /// Returns `true` when `id` has been visited.
    pub fn contains(&self, id: u64) -> bool {
        self.seen.contains(&id)
    }

    /// Resets the set.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    /// Number of visited ids.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` when nothing has been visited.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
