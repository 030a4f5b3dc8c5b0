//! Disk persistence for the HNSW index.
//!
//! An index serializes to `{metadata, nodes, entry_point}` using bincode.
//! Writes use atomic temp-file + rename to prevent corruption on crash,
//! and a CRC32 checksum is appended behind a 4-byte magic footer for
//! integrity verification. The metadata's version string gates load
//! compatibility.
//!
//! The metric is not part of the persisted configuration; callers supply
//! its identifier again on load, exactly as they do at construction.

use crate::hnsw::distance::DistanceMetric;
use crate::hnsw::graph::{HnswConfig, HnswIndex};
use crate::hnsw::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Magic bytes appended before the CRC32 footer.
const SNAPSHOT_CRC_MAGIC: &[u8; 4] = b"NVS1";

/// Snapshot format version accepted by [`load_index`].
pub const FORMAT_VERSION: &str = "1.0";

/// Metadata stored alongside the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Format version; loads are rejected on mismatch.
    pub version: String,
    /// When the snapshot was written.
    pub created_at: SystemTime,
    /// Number of node records in the snapshot.
    pub nodes_count: usize,
    /// Highest level assigned in the graph.
    pub max_level: usize,
    /// Index configuration.
    pub config: HnswConfig,
    /// Optional free-form description.
    pub description: String,
}

/// Plain serializable snapshot of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Client-supplied node id.
    pub id: u64,
    /// The stored vector.
    pub vector: Vec<f64>,
    /// The node's assigned maximum level.
    pub level: usize,
    /// Neighbor ids per level, one entry for each level in `0..=level`.
    pub neighbors: Vec<Vec<u64>>,
    /// Soft-deletion flag.
    pub deleted: bool,
}

/// Complete persisted state of an index.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveData {
    /// Snapshot metadata; its version field gates load compatibility.
    pub metadata: IndexMetadata,
    /// All node records, sorted by id for deterministic output.
    pub nodes: Vec<NodeRecord>,
    /// The entry point at snapshot time.
    pub entry_point: Option<u64>,
}

/// Saves the index state to `path` with atomic write.
pub fn save_index(index: &HnswIndex, path: &Path, description: &str) -> io::Result<()> {
    let data = snapshot(index, description);
    let bytes = bincode::serialize(&data).map_err(|e| io::Error::other(e.to_string()))?;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    // Plaintext: [bincode payload][magic "NVS1" 4B][CRC32 4B BE]
    let crc = crc32fast::hash(&bytes);
    let mut out = Vec::with_capacity(bytes.len() + 8);
    out.extend_from_slice(&bytes);
    out.extend_from_slice(SNAPSHOT_CRC_MAGIC);
    out.extend_from_slice(&crc.to_be_bytes());

    // Atomic write: write to temp, then rename.
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, &out)?;
    fs::rename(&tmp_path, path)?;

    tracing::info!(
        "Saved index to {:?} ({} nodes, {} bytes, CRC32={:#010x})",
        path,
        data.metadata.nodes_count,
        bytes.len(),
        crc
    );
    Ok(())
}

/// Loads an index from `path`, verifying integrity and rebuilding the
/// graph. `metric_name` is resolved the same way construction resolves it.
pub fn load_index(path: &Path, metric_name: &str) -> io::Result<HnswIndex> {
    let data = read_snapshot(path)?;
    let metric = DistanceMetric::from_name(metric_name)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    validate_loaded(&data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid snapshot: {e}")))?;

    let mut nodes: HashMap<u64, Arc<Node>> = HashMap::with_capacity(data.nodes.len());
    for record in data.nodes {
        nodes.insert(
            record.id,
            Arc::new(Node::from_parts(
                record.id,
                record.vector,
                record.level,
                record.neighbors,
                record.deleted,
            )),
        );
    }

    tracing::info!(
        "Loaded index from {:?} ({} nodes, max level {})",
        path,
        nodes.len(),
        data.metadata.max_level
    );

    Ok(HnswIndex::from_parts(
        data.metadata.config,
        metric,
        nodes,
        data.entry_point,
        data.metadata.max_level,
    ))
}

/// Reads only the metadata of a saved index.
pub fn index_info(path: &Path) -> io::Result<IndexMetadata> {
    Ok(read_snapshot(path)?.metadata)
}

fn snapshot(index: &HnswIndex, description: &str) -> SaveData {
    // Collect handles under the map lock, then read each node after
    // releasing it: the index lock is never held while a node lock is
    // taken.
    let handles: Vec<Arc<Node>> = index.nodes.read().values().cloned().collect();
    let entry_point = index.entry_point();
    let max_level = index.max_level();

    let mut nodes: Vec<NodeRecord> = handles
        .iter()
        .map(|node| NodeRecord {
            id: node.id(),
            vector: node.vector(),
            level: node.level(),
            neighbors: node.all_neighbors(),
            deleted: node.is_deleted(),
        })
        .collect();
    nodes.sort_by_key(|record| record.id);

    SaveData {
        metadata: IndexMetadata {
            version: FORMAT_VERSION.to_string(),
            created_at: SystemTime::now(),
            nodes_count: nodes.len(),
            max_level,
            config: index.config().clone(),
            description: description.to_string(),
        },
        nodes,
        entry_point,
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn read_snapshot(path: &Path) -> io::Result<SaveData> {
    let raw = fs::read(path)?;

    if raw.len() < 8 || &raw[raw.len() - 8..raw.len() - 4] != SNAPSHOT_CRC_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("snapshot {path:?} has no checksum footer"),
        ));
    }

    let payload = &raw[..raw.len() - 8];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "snapshot CRC32 mismatch: expected {stored_crc:#010x}, got {computed_crc:#010x}. File may be corrupted: {path:?}"
            ),
        ));
    }
    tracing::debug!("Snapshot CRC32 verified: {:#010x}", stored_crc);

    bincode::deserialize(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Validation checks on loaded data before the graph is rebuilt.
fn validate_loaded(data: &SaveData) -> Result<(), String> {
    if data.metadata.version != FORMAT_VERSION {
        return Err(format!(
            "unsupported index version: {}",
            data.metadata.version
        ));
    }

    if data.nodes.len() != data.metadata.nodes_count {
        return Err(format!(
            "node count mismatch: metadata={}, actual={}",
            data.metadata.nodes_count,
            data.nodes.len()
        ));
    }

    data.metadata
        .config
        .validate()
        .map_err(|e| format!("invalid config: {e}"))?;

    let ids: std::collections::HashSet<u64> = data.nodes.iter().map(|n| n.id).collect();
    if ids.len() != data.nodes.len() {
        return Err("duplicate node ids in snapshot".to_string());
    }

    match data.entry_point {
        Some(ep) if !ids.contains(&ep) => {
            return Err(format!("invalid entry point: {ep}"));
        }
        None if !data.nodes.is_empty() => {
            return Err("missing entry point for non-empty snapshot".to_string());
        }
        _ => {}
    }

    for record in &data.nodes {
        if record.neighbors.len() > record.level + 1 {
            return Err(format!(
                "node {} has {} neighbor levels but level {}",
                record.id,
                record.neighbors.len(),
                record.level
            ));
        }
        if record.level > data.metadata.max_level {
            return Err(format!(
                "node {} level {} exceeds max level {}",
                record.id, record.level, data.metadata.max_level
            ));
        }
        for list in &record.neighbors {
            for neighbor in list {
                if !ids.contains(neighbor) {
                    return Err(format!(
                        "node {} references unknown neighbor {}",
                        record.id, neighbor
                    ));
                }
            }
        }
    }

    Ok(())
}
