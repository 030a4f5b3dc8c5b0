//! Storage layer: snapshot persistence for the index.

/// Disk persistence: bincode snapshots with CRC32 footer and atomic writes.
pub mod persistence;

pub use persistence::{index_info, load_index, save_index, IndexMetadata, NodeRecord, SaveData};
