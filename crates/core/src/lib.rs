//! # nearvec-core
//!
//! Embeddable in-memory approximate nearest-neighbor index based on the
//! Hierarchical Navigable Small World (HNSW) graph.
//!
//! Vectors are double-precision and immutable after insertion. The graph is
//! id-addressed: adjacency lists hold node ids, never owning handles, and
//! lookups go through the index's id-to-node map. Inserts and searches may
//! run concurrently from multiple threads; see the `hnsw` module docs for
//! the locking model.
//!
//! This is the core library crate with zero async dependencies, suitable
//! for embedding directly in Rust or other language bindings.

/// Global configuration constants: limits and default tuning parameters.
pub mod config;
/// Error types for index construction, insertion, and node mutation.
pub mod error;
/// HNSW approximate nearest neighbor index: graph structure, search, insertion, and distance metrics.
pub mod hnsw;
/// Storage layer: snapshot persistence for the index.
pub mod storage;
