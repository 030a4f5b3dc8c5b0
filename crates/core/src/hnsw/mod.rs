//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor index.
//!
//! This module implements the HNSW algorithm for fast approximate nearest
//! neighbor search over immutable f64 vectors. Level 0 holds every node;
//! upper levels hold geometrically thinning subsets, so a query descends
//! from the sparse top of the graph toward its neighborhood in logarithmic
//! expected time.
//!
//! Concurrency uses two lock levels: the index guards its id-to-node map
//! and the `(entry_point, max_level)` pair with reader-writer locks, and
//! every node guards its own neighbor lists and deletion flag. Traversal
//! reads one node's list at a time, by copy, and no operation ever holds
//! more than one node lock at once.

/// Distance metrics: euclidean, manhattan, cosine, and dot product.
pub mod distance;
/// HNSW graph structure, configuration, and index state.
pub mod graph;
/// HNSW insertion: greedy descent, bidirectional linking, and degree trimming.
pub mod insert;
/// Graph nodes: per-level neighbor lists behind a reader-writer lock.
pub mod node;
/// Priority queues used as search frontier and bounded result buffer.
pub mod queue;
/// HNSW search: single-layer traversal and multi-layer KNN.
pub mod search;
/// Neighbor selection: simple nearest-M and diversity-aware heuristic.
pub mod select;
/// Visited-id set for graph traversal.
pub mod visited;

pub use distance::DistanceMetric;
pub use graph::{HnswConfig, HnswIndex};
pub use node::Node;
pub use search::{knn_search, knn_search_with_distances, search};
