//! HNSW insertion.
//!
//! Builds the multi-layer graph incrementally: a level draw, a greedy
//! descent to just above the new node's level, a per-layer candidate
//! search with `ef_construction`, diversity-aware linking in both
//! directions, and a degree trim on any neighbor pushed past `max_m`.

use crate::error::HnswError;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::node::Node;
use crate::hnsw::search::search_layer;
use std::sync::Arc;

impl HnswIndex {
    /// Inserts `(id, vector)` into the index.
    ///
    /// Fails with [`HnswError::DuplicateId`] when the id is already
    /// present; nothing is mutated in that case. Once registered, the node
    /// is linked level by level under per-node locks; concurrent searches
    /// may observe it before all of its levels are linked, which only
    /// delays when it becomes findable.
    pub fn insert(&self, id: u64, vector: Vec<f64>) -> Result<(), HnswError> {
        // Register under the map write lock; reject duplicates before any
        // state changes.
        let node = {
            let mut nodes = self.nodes.write();
            if nodes.contains_key(&id) {
                return Err(HnswError::DuplicateId(id));
            }
            let level = self.random_level();
            let node = Arc::new(Node::new(id, vector, level));
            nodes.insert(id, Arc::clone(&node));
            node
        };
        let level = node.level();

        // First node becomes the entry point.
        {
            let mut state = self.state.write();
            if state.entry_point.is_none() {
                state.entry_point = Some(id);
                state.max_level = level;
                tracing::debug!(id, level, "inserted entry node");
                return Ok(());
            }
        }

        let (entry_point, max_level) = {
            let state = self.state.read();
            let ep = state
                .entry_point
                .expect("entry_point is Some after the first-node branch");
            (ep, state.max_level)
        };

        // Descent: from the top of the graph down to just above the new
        // node's level. A layer ends only when a full pass over the
        // current node's neighbors finds nothing strictly closer.
        let mut current = entry_point;
        let mut current_dist = self.distance_to(node.vector_ref(), current);
        for lc in (level + 1..=max_level).rev() {
            loop {
                let cur_node = match self.get(current) {
                    Some(n) => n,
                    None => break,
                };
                let mut best = current;
                let mut best_dist = current_dist;
                for neighbor in cur_node.get_neighbors(lc) {
                    let d = self.distance_to(node.vector_ref(), neighbor);
                    if d < best_dist {
                        best = neighbor;
                        best_dist = d;
                    }
                }
                if best == current {
                    break;
                }
                current = best;
                current_dist = best_dist;
            }
        }

        // Link phase: connect on every layer the new node shares with the
        // existing graph, top down. Each layer's nearest candidate carries
        // the descent into the next one.
        let top = level.min(max_level);
        for lc in (0..=top).rev() {
            let candidates = search_layer(
                self,
                node.vector_ref(),
                current,
                self.config.ef_construction,
                lc,
            );
            let candidate_ids: Vec<u64> = candidates
                .iter()
                .map(|&(cid, _)| cid)
                .filter(|&cid| cid != id)
                .collect();

            let neighbors = self.select_neighbors_heuristic(
                node.vector_ref(),
                &candidate_ids,
                self.config.m,
                lc,
                true,
                true,
            );

            for &neighbor_id in &neighbors {
                // The pool extension can resurface the new node through a
                // concurrent back-link; a list never references its owner.
                if neighbor_id == id {
                    continue;
                }
                node.add_neighbor(lc, neighbor_id)?;
                if let Some(neighbor) = self.get(neighbor_id) {
                    if neighbor.add_neighbor(lc, id).is_ok() {
                        self.trim_neighbors(&neighbor, lc);
                    }
                }
            }

            if let Some(&(next, _)) = candidates.iter().find(|&&(cid, _)| cid != id) {
                current = next;
            }
        }

        // Promote the entry point when the new node tops the graph.
        {
            let mut state = self.state.write();
            if level > state.max_level {
                state.max_level = level;
                state.entry_point = Some(id);
            }
        }

        tracing::debug!(id, level, "inserted node");
        Ok(())
    }

    /// Re-selects a neighbor list down to `max_m` after a link pushed it
    /// over the cap, keyed by distance to the owning node's vector. The
    /// re-check and the replacement run inside one hold of the node's
    /// lock, so a link landing concurrently is either part of the
    /// re-selection or appended after it, never silently wiped. The
    /// selection itself touches only the id-to-node map and immutable
    /// vectors, no other node's lock. Edges dropped by the rewrite are
    /// removed from the far side as well, so links stay bidirectional.
    fn trim_neighbors(&self, node: &Node, level: usize) {
        if node.get_neighbors(level).len() <= self.config.max_m {
            return;
        }

        let removed = node.rewrite_neighbors(level, |list| {
            if list.len() <= self.config.max_m {
                return list.to_vec();
            }
            self.select_neighbors_heuristic(
                node.vector_ref(),
                list,
                self.config.max_m,
                level,
                false,
                true,
            )
        });
        let removed = match removed {
            Ok(removed) => removed,
            // Deleted out from under us; its links no longer matter.
            Err(_) => return,
        };
        if removed.is_empty() {
            return;
        }
        for &dropped in &removed {
            if let Some(far) = self.get(dropped) {
                let _ = far.remove_neighbor(level, node.id());
            }
        }
        tracing::debug!(
            id = node.id(),
            level,
            dropped = removed.len(),
            "trimmed neighbor list"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::error::HnswError;
    use crate::hnsw::graph::{HnswConfig, HnswIndex};

    fn index() -> HnswIndex {
        HnswIndex::with_seed(HnswConfig::default(), "euclidean", 42).unwrap()
    }

    #[test]
    fn test_first_insert_sets_entry_point() {
        let idx = index();
        idx.insert(7, vec![1.0, 2.0]).unwrap();
        assert_eq!(idx.entry_point(), Some(7));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_id_zero_is_a_legal_id() {
        let idx = index();
        idx.insert(0, vec![1.0, 1.0]).unwrap();
        assert_eq!(idx.entry_point(), Some(0));
        idx.insert(1, vec![2.0, 2.0]).unwrap();
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn test_duplicate_insert_fails_without_mutation() {
        let idx = index();
        idx.insert(1, vec![1.0, 1.0]).unwrap();
        let err = idx.insert(1, vec![9.0, 9.0]).unwrap_err();
        assert!(matches!(err, HnswError::DuplicateId(1)));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get_vector(1), Some(vec![1.0, 1.0]));
    }

    #[test]
    fn test_edges_are_bidirectional() {
        let idx = index();
        for id in 0..20u64 {
            idx.insert(id, vec![id as f64, (id % 5) as f64]).unwrap();
        }
        for id in idx.ids() {
            let node = idx.get(id).unwrap();
            for (level, list) in node.all_neighbors().into_iter().enumerate() {
                for neighbor in list {
                    let back = idx.get(neighbor).unwrap().get_neighbors(level);
                    assert!(
                        back.contains(&id),
                        "edge {id}->{neighbor} at level {level} has no reverse"
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_self_loops() {
        let idx = index();
        for id in 0..30u64 {
            idx.insert(id, vec![(id * 3 % 7) as f64, (id * 5 % 11) as f64])
                .unwrap();
        }
        for id in idx.ids() {
            let node = idx.get(id).unwrap();
            for list in node.all_neighbors() {
                assert!(!list.contains(&id), "node {id} references itself");
            }
        }
    }

    #[test]
    fn test_degree_stays_capped() {
        let cfg = HnswConfig::new(2, 3, 20, false).unwrap();
        let idx = HnswIndex::with_seed(cfg, "euclidean", 11).unwrap();
        for id in 0..60u64 {
            idx.insert(id, vec![(id % 8) as f64, (id / 8) as f64]).unwrap();
        }
        for id in idx.ids() {
            let node = idx.get(id).unwrap();
            for (level, list) in node.all_neighbors().into_iter().enumerate() {
                assert!(
                    list.len() <= idx.config().max_m,
                    "node {id} level {level} degree {} exceeds MaxM {}",
                    list.len(),
                    idx.config().max_m
                );
            }
        }
    }

    #[test]
    fn test_entry_point_promoted_on_level_growth() {
        let idx = index();
        let mut top_id = 0;
        let mut top_level = 0;
        for id in 0..200u64 {
            idx.insert(id, vec![id as f64]).unwrap();
            let level = idx.get(id).unwrap().level();
            if id == 0 || level > top_level {
                top_id = id;
                top_level = level;
            }
        }
        assert_eq!(idx.max_level(), top_level);
        assert_eq!(
            idx.entry_point(),
            Some(top_id),
            "entry point must follow the highest-level node"
        );
        let ep_level = idx.get(idx.entry_point().unwrap()).unwrap().level();
        assert_eq!(ep_level, idx.max_level());
    }

    #[test]
    fn test_neighbor_lists_only_reference_stored_nodes() {
        let idx = index();
        for id in 0..40u64 {
            idx.insert(id, vec![(id % 6) as f64, (id % 9) as f64]).unwrap();
        }
        for id in idx.ids() {
            for list in idx.get(id).unwrap().all_neighbors() {
                for neighbor in list {
                    assert!(idx.contains(neighbor), "dangling neighbor id {neighbor}");
                }
            }
        }
    }
}
