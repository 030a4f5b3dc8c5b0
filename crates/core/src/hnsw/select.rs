//! Neighbor selection.
//!
//! Two strategies reduce a candidate list to at most `m` ids: plain
//! nearest-m, and the diversity-aware heuristic from the HNSW paper
//! (Algorithm 4). The heuristic admits a candidate only when the query is
//! closer to it than any already-selected neighbor is, which spreads edges
//! across directions instead of clustering them around one side of the
//! query. That spread is what keeps the graph navigable.

use crate::hnsw::graph::HnswIndex;
use crate::hnsw::queue::NearestQueue;
use crate::hnsw::visited::VisitedSet;

impl HnswIndex {
    /// Ranks `candidates` by distance to `query` and keeps the `m`
    /// nearest. Returns the list unchanged when it already fits.
    pub fn select_neighbors_simple(&self, query: &[f64], candidates: &[u64], m: usize) -> Vec<u64> {
        if candidates.len() <= m {
            return candidates.to_vec();
        }

        let mut queue = NearestQueue::new();
        for &id in candidates {
            queue.push(id, self.distance_to(query, id));
        }

        let mut selected = Vec::with_capacity(m);
        while selected.len() < m {
            match queue.pop() {
                Some((id, _)) => selected.push(id),
                None => break,
            }
        }
        selected
    }

    /// Diversity-aware selection (Algorithm 4 from the HNSW paper).
    ///
    /// `extend_candidates` widens the pool with the candidates' own
    /// level-`level` neighbors before selecting; `keep_pruned` refills the
    /// result from discarded candidates, nearest first, until `m` is
    /// reached. A candidate that ties with a selected neighbor is admitted:
    /// rejection requires a selected neighbor strictly closer to it than
    /// the query is.
    pub fn select_neighbors_heuristic(
        &self,
        query: &[f64],
        candidates: &[u64],
        m: usize,
        level: usize,
        extend_candidates: bool,
        keep_pruned: bool,
    ) -> Vec<u64> {
        let mut working = NearestQueue::new();
        let mut seen = VisitedSet::new();

        for &id in candidates {
            if seen.insert(id) {
                working.push(id, self.distance_to(query, id));
            }
        }

        if extend_candidates {
            for &id in candidates {
                let node = match self.get(id) {
                    Some(node) => node,
                    None => continue,
                };
                for neighbor in node.get_neighbors(level) {
                    if seen.insert(neighbor) {
                        working.push(neighbor, self.distance_to(query, neighbor));
                    }
                }
            }
        }

        let mut selected: Vec<u64> = Vec::with_capacity(m);
        let mut discarded = NearestQueue::new();

        while selected.len() < m {
            let (id, dist) = match working.pop() {
                Some(entry) => entry,
                None => break,
            };
            let node = match self.get(id) {
                Some(node) => node,
                None => continue,
            };
            // Admit unless some already-selected neighbor is strictly
            // closer to this candidate than the query is.
            let dominated = selected.iter().any(|&sel| match self.get(sel) {
                Some(sel_node) => {
                    self.metric
                        .distance(sel_node.vector_ref(), node.vector_ref())
                        < dist
                }
                None => false,
            });
            if dominated {
                discarded.push(id, dist);
            } else {
                selected.push(id);
            }
        }

        if keep_pruned {
            while selected.len() < m {
                match discarded.pop() {
                    Some((id, _)) => selected.push(id),
                    None => break,
                }
            }
        }

        selected
    }
}
