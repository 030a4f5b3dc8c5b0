//! Global configuration constants for nearvec.
//!
//! All default tuning parameters and input validation limits are defined
//! here. Runtime configuration is carried by `hnsw::graph::HnswConfig`.

/// Default target number of bidirectional links per node per layer.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64. Default: 16.
pub const DEFAULT_M: usize = 16;

/// Default hard ceiling on a node's neighbor count on any layer.
///
/// Linking may momentarily push a list past the target degree; the list is
/// then re-selected down to this cap.
pub const DEFAULT_MAX_M: usize = 32;

/// Default ef parameter during index construction.
///
/// Controls the size of the dynamic candidate list during insertion.
/// Higher values produce a better graph but slow down build time.
pub const DEFAULT_EF_CONSTRUCTION: usize = 100;

/// Default ef parameter during search.
///
/// Controls the size of the dynamic candidate list during query.
/// Higher values improve recall at the cost of latency.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Ceiling on generated node levels.
///
/// The exponential level draw is unbounded in theory; capping it keeps a
/// pathological draw from creating a towering near-empty hierarchy.
pub const MAX_LEVEL_CAP: usize = 16;

/// Maximum allowed vector dimension accepted by the demonstrator.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum number of results (`k`) per search request accepted by the demonstrator.
pub const MAX_K: usize = 10_000;
