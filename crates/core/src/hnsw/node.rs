//! Graph nodes.
//!
//! A [`Node`] is the persistent record for one inserted vector: id, payload,
//! assigned maximum level, and one neighbor list per level. Adjacency holds
//! ids, never owning handles: lookup always goes back through the index's
//! id-to-node map, so the graph has no ownership cycles.

use crate::error::HnswError;
use parking_lot::RwLock;

/// Mutable node state guarded by the node's lock.
#[derive(Debug)]
struct NodeState {
    /// Neighbor ids per level, one slot for each level in `0..=level`.
    neighbors: Vec<Vec<u64>>,
    deleted: bool,
}

/// A node in the HNSW graph.
///
/// `id`, `vector`, and `level` are immutable after creation and readable
/// without locking. The neighbor lists and the deletion flag sit behind a
/// reader-writer lock; mutating operations take it exclusively, reads take
/// it shared and return defensive copies so callers never iterate while
/// holding the lock.
#[derive(Debug)]
pub struct Node {
    id: u64,
    vector: Vec<f64>,
    level: usize,
    state: RwLock<NodeState>,
}

impl Node {
    /// Creates a node with empty neighbor lists on levels `0..=level`.
    pub fn new(id: u64, vector: Vec<f64>, level: usize) -> Self {
        Self {
            id,
            vector,
            level,
            state: RwLock::new(NodeState {
                neighbors: vec![Vec::new(); level + 1],
                deleted: false,
            }),
        }
    }

    /// Rebuilds a node from persisted state.
    ///
    /// `neighbors` must hold one list per level in `0..=level`; missing
    /// trailing levels are filled with empty lists.
    pub(crate) fn from_parts(
        id: u64,
        vector: Vec<f64>,
        level: usize,
        mut neighbors: Vec<Vec<u64>>,
        deleted: bool,
    ) -> Self {
        neighbors.resize(level + 1, Vec::new());
        Self {
            id,
            vector,
            level,
            state: RwLock::new(NodeState { neighbors, deleted }),
        }
    }

    /// The node's id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The node's assigned maximum level.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns a copy of the stored vector.
    pub fn vector(&self) -> Vec<f64> {
        self.vector.clone()
    }

    /// Borrow of the stored vector. Safe without the node lock: the vector
    /// is immutable after insertion.
    pub fn vector_ref(&self) -> &[f64] {
        &self.vector
    }

    fn check_level(&self, level: usize) -> Result<(), HnswError> {
        if level > self.level {
            return Err(HnswError::LevelOutOfRange {
                id: self.id,
                level,
                max: self.level,
            });
        }
        Ok(())
    }

    /// Appends `neighbor` to the level's list if absent; no-op when already
    /// present. Fails on a deleted node or a level outside `0..=level`.
    pub fn add_neighbor(&self, level: usize, neighbor: u64) -> Result<(), HnswError> {
        self.check_level(level)?;
        let mut state = self.state.write();
        if state.deleted {
            return Err(HnswError::NodeDeleted(self.id));
        }
        let list = &mut state.neighbors[level];
        if !list.contains(&neighbor) {
            list.push(neighbor);
        }
        Ok(())
    }

    /// Removes `neighbor` from the level's list; fails when absent, on a
    /// deleted node, or on a level outside `0..=level`.
    pub fn remove_neighbor(&self, level: usize, neighbor: u64) -> Result<(), HnswError> {
        self.check_level(level)?;
        let mut state = self.state.write();
        if state.deleted {
            return Err(HnswError::NodeDeleted(self.id));
        }
        let list = &mut state.neighbors[level];
        match list.iter().position(|&n| n == neighbor) {
            Some(pos) => {
                list.remove(pos);
                Ok(())
            }
            None => Err(HnswError::MissingNeighbor {
                id: self.id,
                level,
                neighbor,
            }),
        }
    }

    /// Replaces the level's list with a copy of `neighbors`.
    pub fn set_neighbors(&self, level: usize, neighbors: &[u64]) -> Result<(), HnswError> {
        self.check_level(level)?;
        let mut state = self.state.write();
        if state.deleted {
            return Err(HnswError::NodeDeleted(self.id));
        }
        state.neighbors[level] = neighbors.to_vec();
        Ok(())
    }

    /// Returns a copy of the level's neighbor list.
    ///
    /// Levels above the node's maximum read as empty rather than erroring,
    /// and deleted nodes still expose their lists: traversal must be able
    /// to probe any layer and to pass through soft-deleted nodes to reach
    /// live neighbors behind them.
    pub fn get_neighbors(&self, level: usize) -> Vec<u64> {
        let state = self.state.read();
        state.neighbors.get(level).cloned().unwrap_or_default()
    }

    /// Rewrites the level's list under one exclusive lock hold: `f`
    /// receives the current list and returns its replacement. Because the
    /// read and the write happen inside the same critical section, a
    /// concurrent `add_neighbor` cannot land in between and be silently
    /// overwritten. Returns the ids the rewrite dropped. Fails on a
    /// deleted node or a level outside `0..=level`.
    pub(crate) fn rewrite_neighbors<F>(&self, level: usize, f: F) -> Result<Vec<u64>, HnswError>
    where
        F: FnOnce(&[u64]) -> Vec<u64>,
    {
        self.check_level(level)?;
        let mut state = self.state.write();
        if state.deleted {
            return Err(HnswError::NodeDeleted(self.id));
        }
        let replacement = f(&state.neighbors[level]);
        let removed = state.neighbors[level]
            .iter()
            .copied()
            .filter(|id| !replacement.contains(id))
            .collect();
        state.neighbors[level] = replacement;
        Ok(removed)
    }

    /// Empties the level's list.
    pub fn clear_neighbors(&self, level: usize) -> Result<(), HnswError> {
        self.check_level(level)?;
        let mut state = self.state.write();
        if state.deleted {
            return Err(HnswError::NodeDeleted(self.id));
        }
        state.neighbors[level].clear();
        Ok(())
    }

    /// Snapshot of every level's neighbor list, indexed by level.
    pub fn all_neighbors(&self) -> Vec<Vec<u64>> {
        self.state.read().neighbors.clone()
    }

    /// Marks the node as soft-deleted. Searches stop returning it; its
    /// lists remain readable for traversal.
    pub fn mark_deleted(&self) {
        self.state.write().deleted = true;
    }

    /// Returns `true` when the node is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.state.read().deleted
    }
}
