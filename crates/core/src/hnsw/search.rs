//! HNSW search: single-layer traversal and multi-layer KNN.
//!
//! Traversal reads one node's neighbor list at a time, by copy, so a search
//! concurrent with inserts observes a snapshot per node rather than a
//! frozen graph. Soft-deleted nodes stay on the frontier, since live
//! neighbors behind them must remain reachable, but are never admitted to
//! results.

use crate::config;
use crate::hnsw::graph::HnswIndex;
use crate::hnsw::queue::{BoundedNearest, NearestQueue};
use crate::hnsw::visited::VisitedSet;

/// Searches a single layer of the graph.
///
/// Bounded best-first traversal of `level` starting from `entry_id`,
/// returning up to `ef` `(id, distance)` pairs, nearest first. The entry
/// node is seeded directly, so an entry with no neighbors at this level
/// still yields itself. Distances are computed on demand and not cached.
///
/// An `ef` of zero is treated as 1: a zero-capacity result buffer would
/// evict every admission and disable the early-exit bound, turning the
/// traversal into an always-empty full walk.
pub fn search_layer(
    index: &HnswIndex,
    query: &[f64],
    entry_id: u64,
    ef: usize,
    level: usize,
) -> Vec<(u64, f64)> {
    let entry = match index.get(entry_id) {
        Some(node) => node,
        None => return Vec::new(),
    };

    let mut visited = VisitedSet::new();
    let mut frontier = NearestQueue::new();
    let mut results = BoundedNearest::new(ef.max(1));
    // Cached worst distance avoids repeated heap peeks in the hot loop.
    let mut worst_dist = f64::INFINITY;

    let entry_dist = index.metric.distance(query, entry.vector_ref());
    visited.insert(entry_id);
    frontier.push(entry_id, entry_dist);
    if !entry.is_deleted() {
        results.push(entry_id, entry_dist);
        if results.at_capacity() {
            worst_dist = results.worst().unwrap_or(f64::INFINITY);
        }
    }

    while let Some((candidate_id, candidate_dist)) = frontier.pop() {
        // If the closest open candidate is farther than the worst result,
        // no closer node can be reached through it: stop.
        if results.at_capacity() && candidate_dist > worst_dist {
            break;
        }

        let candidate = match index.get(candidate_id) {
            Some(node) => node,
            None => continue,
        };

        for neighbor_id in candidate.get_neighbors(level) {
            if !visited.insert(neighbor_id) {
                continue;
            }
            let neighbor = match index.get(neighbor_id) {
                Some(node) => node,
                None => continue,
            };
            let dist = index.metric.distance(query, neighbor.vector_ref());
            if !results.at_capacity() || dist < worst_dist {
                frontier.push(neighbor_id, dist);
                if !neighbor.is_deleted() {
                    results.push(neighbor_id, dist);
                    if results.at_capacity() {
                        worst_dist = results.worst().unwrap_or(f64::INFINITY);
                    }
                }
            }
        }
    }

    results.into_sorted_vec()
}

/// Multi-layer KNN search returning up to `k` ids, nearest first.
///
/// Descends with `ef = 1` from the top layer down to layer 1, then runs a
/// single `ef`-wide pass at layer 0 and truncates to `k`.
pub fn knn_search(index: &HnswIndex, query: &[f64], k: usize, ef: usize) -> Vec<u64> {
    knn_search_with_distances(index, query, k, ef)
        .into_iter()
        .map(|(id, _)| id)
        .collect()
}

/// Multi-layer KNN search returning `(id, distance)` pairs, nearest first.
///
/// Distances are computed against the stored vectors. An empty index
/// yields an empty result.
pub fn knn_search_with_distances(
    index: &HnswIndex,
    query: &[f64],
    k: usize,
    ef: usize,
) -> Vec<(u64, f64)> {
    let entry_point = match index.entry_point() {
        Some(ep) => ep,
        None => return Vec::new(),
    };
    let max_level = index.max_level();

    // An ef=1 traversal is greedy descent that also handles distance ties
    // through the heap.
    let mut current = entry_point;
    for level in (1..=max_level).rev() {
        let nearest = search_layer(index, query, current, 1, level);
        if let Some(&(id, _)) = nearest.first() {
            current = id;
        }
    }

    let mut results = search_layer(index, query, current, ef, 0);
    results.truncate(k);
    tracing::debug!(
        k,
        ef,
        found = results.len(),
        "knn search completed"
    );
    results
}

/// K-NN search with a default horizon of `max(2k, DEFAULT_EF_SEARCH)`.
///
/// Returns ids and their distances as parallel sequences of equal length
/// `<= k`, nearest first.
pub fn search(index: &HnswIndex, query: &[f64], k: usize) -> (Vec<u64>, Vec<f64>) {
    let ef = (2 * k).max(config::DEFAULT_EF_SEARCH);
    knn_search_with_distances(index, query, k, ef)
        .into_iter()
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::graph::HnswConfig;

    fn small_index() -> HnswIndex {
        let index = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 42).unwrap();
        for (id, v) in [
            (1, vec![1.0, 1.0]),
            (2, vec![2.0, 2.0]),
            (3, vec![10.0, 10.0]),
            (4, vec![11.0, 11.0]),
        ] {
            index.insert(id, v).unwrap();
        }
        index
    }

    #[test]
    fn test_search_layer_returns_entry_when_isolated() {
        let index = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 1).unwrap();
        index.insert(5, vec![0.0, 0.0]).unwrap();
        let results = search_layer(&index, &[1.0, 1.0], 5, 10, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 5);
    }

    #[test]
    fn test_search_layer_missing_entry() {
        let index = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 1).unwrap();
        assert!(search_layer(&index, &[1.0], 99, 10, 0).is_empty());
    }

    #[test]
    fn test_zero_ef_treated_as_one() {
        let index = small_index();
        let entry = index.entry_point().unwrap();
        let results = search_layer(&index, &[1.0, 1.0], entry, 0, 0);
        assert_eq!(results.len(), 1);
        assert_eq!(knn_search(&index, &[1.0, 1.0], 1, 0), vec![1]);
    }

    #[test]
    fn test_search_layer_bounded_by_ef() {
        let index = small_index();
        let results = search_layer(&index, &[0.0, 0.0], index.entry_point().unwrap(), 2, 0);
        assert!(results.len() <= 2);
    }

    #[test]
    fn test_knn_search_empty_index() {
        let index = HnswIndex::new(HnswConfig::default(), "euclidean").unwrap();
        assert!(knn_search(&index, &[1.0, 2.0], 5, 10).is_empty());
        let (ids, distances) = search(&index, &[1.0, 2.0], 5);
        assert!(ids.is_empty());
        assert!(distances.is_empty());
    }

    #[test]
    fn test_knn_search_finds_nearest() {
        let index = small_index();
        let results = knn_search(&index, &[1.1, 1.1], 2, 10);
        assert_eq!(results.first(), Some(&1));
    }

    #[test]
    fn test_knn_search_with_distances_sorted() {
        let index = small_index();
        let results = knn_search_with_distances(&index, &[0.0, 0.0], 4, 10);
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "distances must be non-decreasing");
        }
    }

    #[test]
    fn test_deleted_node_excluded_from_results() {
        let index = small_index();
        assert!(index.remove(1));
        let results = knn_search(&index, &[1.0, 1.0], 4, 10);
        assert!(!results.contains(&1), "deleted node must not be returned");
        assert!(results.contains(&2));
    }

    #[test]
    fn test_search_parallel_outputs() {
        let index = small_index();
        let (ids, distances) = search(&index, &[10.0, 10.0], 3);
        assert_eq!(ids.len(), distances.len());
        assert_eq!(ids.first(), Some(&3));
    }

    #[test]
    fn test_dimension_mismatch_degenerates() {
        let index = small_index();
        // A 3-dim query against 2-dim vectors: every distance is infinite,
        // results still come back but carry infinite distances.
        let results = knn_search_with_distances(&index, &[1.0, 1.0, 1.0], 2, 10);
        for (_, d) in results {
            assert_eq!(d, f64::INFINITY);
        }
    }
}
