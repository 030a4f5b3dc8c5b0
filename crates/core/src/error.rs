//! Error types for the HNSW index.
//!
//! Dimension mismatches are deliberately absent: the distance contract maps
//! them to infinite distances instead (see `hnsw::distance`), so they
//! surface as empty or degenerate search results rather than errors.

use thiserror::Error;

/// Errors produced by index construction, insertion, and node mutation.
///
/// Errors are returned to the immediate caller and never retried
/// internally. A failed `insert` leaves no partial state behind.
#[derive(Debug, Error)]
pub enum HnswError {
    /// Invalid configuration parameter, rejected at index construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Unknown distance metric identifier, rejected at index construction.
    #[error("unsupported distance metric: {0}")]
    UnknownMetric(String),

    /// `insert` called with an id already present in the index.
    #[error("node {0} already exists")]
    DuplicateId(u64),

    /// Neighbor mutation attempted on a soft-deleted node.
    #[error("node {0} is deleted")]
    NodeDeleted(u64),

    /// Level outside the node's `0..=level` range.
    #[error("invalid level {level} for node {id} with max level {max}")]
    LevelOutOfRange {
        /// Id of the node the operation targeted.
        id: u64,
        /// The out-of-range level that was requested.
        level: usize,
        /// The node's assigned maximum level.
        max: usize,
    },

    /// `remove_neighbor` target not present in the level's list.
    #[error("neighbor {neighbor} not found at level {level} of node {id}")]
    MissingNeighbor {
        /// Id of the node whose list was searched.
        id: u64,
        /// Level of the searched list.
        level: usize,
        /// The absent neighbor id.
        neighbor: u64,
    },
}
