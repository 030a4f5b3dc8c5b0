//! HNSW graph structure and configuration.
//!
//! [`HnswConfig`] defines tuning parameters (M, MaxM, ef_construction, mL).
//! [`HnswIndex`] owns the id-to-node map, the entry point, and the level
//! source. Locking is two-level: the map and the `(entry_point, max_level)`
//! pair each sit behind a reader-writer lock, and every [`Node`] guards its
//! own neighbor lists. The index locks are never held while a node lock is
//! taken.

use crate::config;
use crate::error::HnswError;
use crate::hnsw::distance::DistanceMetric;
use crate::hnsw::node::Node;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, recall, and
/// memory usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Target number of bidirectional links per node per layer.
    pub m: usize,
    /// Hard ceiling on a node's neighbor count on any layer (`max_m >= m`).
    pub max_m: usize,
    /// Candidate list size during index construction.
    pub ef_construction: usize,
    /// Level generation scale, typically `1 / ln(m)`.
    pub ml: f64,
    /// Reserved for deletion handling; no rebuild logic is attached yet.
    #[serde(default)]
    pub delay_rebuild: bool,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::DEFAULT_M,
            max_m: config::DEFAULT_MAX_M,
            ef_construction: config::DEFAULT_EF_CONSTRUCTION,
            ml: 1.0 / (config::DEFAULT_M as f64).ln(),
            delay_rebuild: false,
        }
    }
}

impl HnswConfig {
    /// Creates a validated config with `ml` derived as `1 / ln(m)`.
    pub fn new(
        m: usize,
        max_m: usize,
        ef_construction: usize,
        delay_rebuild: bool,
    ) -> Result<Self, HnswError> {
        let ml = if m > 1 { 1.0 / (m as f64).ln() } else { 1.0 };
        let cfg = Self {
            m,
            max_m,
            ef_construction,
            ml,
            delay_rebuild,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> Result<(), HnswError> {
        if self.m == 0 {
            return Err(HnswError::Config(format!(
                "M must be positive, got {}",
                self.m
            )));
        }
        if self.max_m < self.m {
            return Err(HnswError::Config(format!(
                "MaxM must be >= M, got M={}, MaxM={}",
                self.m, self.max_m
            )));
        }
        if self.ef_construction == 0 {
            return Err(HnswError::Config(format!(
                "ef_construction must be positive, got {}",
                self.ef_construction
            )));
        }
        if !self.ml.is_finite() || self.ml <= 0.0 {
            return Err(HnswError::Config(format!(
                "mL must be positive, got {}",
                self.ml
            )));
        }
        Ok(())
    }
}

/// Entry point and maximum level, updated together under one lock.
///
/// `entry_point` is an explicit `Option`; id 0 is a legitimate node id,
/// never a sentinel.
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub entry_point: Option<u64>,
    pub max_level: usize,
}

/// HNSW index: id-addressed nodes, a designated entry point, and a
/// seedable level generator.
///
/// All operations take `&self`; interior locks make the index shareable
/// across threads. Searches hold shared locks only, so inserts and
/// searches proceed in parallel, serialized per node where they touch the
/// same neighbor list.
#[derive(Debug)]
pub struct HnswIndex {
    pub(crate) config: HnswConfig,
    pub(crate) metric: DistanceMetric,
    pub(crate) nodes: RwLock<HashMap<u64, Arc<Node>>>,
    pub(crate) state: RwLock<GraphState>,
    level_rng: Mutex<StdRng>,
}

impl HnswIndex {
    /// Creates an empty index with the given configuration and metric
    /// identifier.
    ///
    /// Fails on invalid config or an unknown metric name, never at query
    /// time.
    pub fn new(config: HnswConfig, metric_name: &str) -> Result<Self, HnswError> {
        Self::build(config, metric_name, StdRng::from_entropy())
    }

    /// Like [`HnswIndex::new`], but with a fixed seed for the level
    /// generator. Given a single thread, an identical seed, config, metric,
    /// and insertion order, two indexes assign identical levels and return
    /// identical results.
    pub fn with_seed(config: HnswConfig, metric_name: &str, seed: u64) -> Result<Self, HnswError> {
        Self::build(config, metric_name, StdRng::seed_from_u64(seed))
    }

    fn build(config: HnswConfig, metric_name: &str, rng: StdRng) -> Result<Self, HnswError> {
        config.validate()?;
        let metric = DistanceMetric::from_name(metric_name)?;
        Ok(Self {
            config,
            metric,
            nodes: RwLock::new(HashMap::new()),
            state: RwLock::new(GraphState::default()),
            level_rng: Mutex::new(rng),
        })
    }

    /// Rebuilds an index from persisted parts. Callers validate the parts
    /// first (see `storage::persistence`).
    pub(crate) fn from_parts(
        config: HnswConfig,
        metric: DistanceMetric,
        nodes: HashMap<u64, Arc<Node>>,
        entry_point: Option<u64>,
        max_level: usize,
    ) -> Self {
        Self {
            config,
            metric,
            nodes: RwLock::new(nodes),
            state: RwLock::new(GraphState {
                entry_point,
                max_level,
            }),
            level_rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// The index configuration.
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// The distance metric in use.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of non-deleted nodes in the index.
    pub fn len(&self) -> usize {
        self.nodes
            .read()
            .values()
            .filter(|n| !n.is_deleted())
            .count()
    }

    /// Returns `true` if the index contains no non-deleted nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when a node with this id is stored (deleted or not).
    pub fn contains(&self, id: u64) -> bool {
        self.nodes.read().contains_key(&id)
    }

    /// Ids of all stored nodes, in unspecified order.
    pub fn ids(&self) -> Vec<u64> {
        self.nodes.read().keys().copied().collect()
    }

    /// Current entry point id; `None` while the index is empty.
    pub fn entry_point(&self) -> Option<u64> {
        self.state.read().entry_point
    }

    /// Highest level assigned so far; 0 when empty.
    pub fn max_level(&self) -> usize {
        self.state.read().max_level
    }

    /// Fetches a node handle by id.
    pub fn get(&self, id: u64) -> Option<Arc<Node>> {
        self.nodes.read().get(&id).cloned()
    }

    /// Returns a copy of a stored vector, or `None` for an unknown id.
    pub fn get_vector(&self, id: u64) -> Option<Vec<f64>> {
        self.get(id).map(|n| n.vector())
    }

    /// Distance from `query` to the stored vector of `id`.
    ///
    /// Unknown ids map to infinity, the same way mismatched dimensions do.
    pub(crate) fn distance_to(&self, query: &[f64], id: u64) -> f64 {
        match self.get(id) {
            Some(node) => self.metric.distance(query, node.vector_ref()),
            None => f64::INFINITY,
        }
    }

    /// Draws a level from the exponential distribution
    /// `floor(-ln(U) · mL)`, capped at [`config::MAX_LEVEL_CAP`].
    pub(crate) fn random_level(&self) -> usize {
        let u: f64 = self.level_rng.lock().gen_range(f64::MIN_POSITIVE..1.0);
        let level = (-u.ln() * self.config.ml).floor() as usize;
        level.min(config::MAX_LEVEL_CAP)
    }

    /// Soft-deletes a node. Returns `true` when the node existed and was
    /// live. The node stays in the graph for traversal but no longer
    /// appears in results.
    pub fn remove(&self, id: u64) -> bool {
        match self.get(id) {
            Some(node) if !node.is_deleted() => {
                node.mark_deleted();
                tracing::debug!(id, "soft-deleted node");
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = HnswConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.m, 16);
        assert_eq!(cfg.max_m, 32);
        assert_eq!(cfg.ef_construction, 100);
        assert!((cfg.ml - 1.0 / (16f64).ln()).abs() < 1e-12);
        assert!(!cfg.delay_rebuild);
    }

    #[test]
    fn test_config_new_derives_ml() {
        let cfg = HnswConfig::new(8, 16, 50, false).unwrap();
        assert!((cfg.ml - 1.0 / (8f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_config_rejects_zero_m() {
        assert!(HnswConfig::new(0, 16, 100, false).is_err());
    }

    #[test]
    fn test_config_rejects_max_m_below_m() {
        assert!(HnswConfig::new(16, 8, 100, false).is_err());
    }

    #[test]
    fn test_config_rejects_zero_ef_construction() {
        assert!(HnswConfig::new(16, 32, 0, false).is_err());
    }

    #[test]
    fn test_config_rejects_non_positive_ml() {
        let cfg = HnswConfig {
            ml: 0.0,
            ..HnswConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = HnswConfig {
            ml: -1.0,
            ..HnswConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_new_empty_index() {
        let index = HnswIndex::new(HnswConfig::default(), "euclidean").unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.entry_point(), None);
        assert_eq!(index.max_level(), 0);
        assert_eq!(index.metric(), DistanceMetric::Euclidean);
    }

    #[test]
    fn test_new_rejects_unknown_metric() {
        let err = HnswIndex::new(HnswConfig::default(), "chebyshev").unwrap_err();
        assert!(err.to_string().contains("chebyshev"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let cfg = HnswConfig {
            m: 0,
            ..HnswConfig::default()
        };
        assert!(HnswIndex::new(cfg, "euclidean").is_err());
    }

    #[test]
    fn test_random_level_respects_cap() {
        let index = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 42).unwrap();
        for _ in 0..1000 {
            assert!(index.random_level() <= config::MAX_LEVEL_CAP);
        }
    }

    #[test]
    fn test_random_level_is_seeded() {
        let a = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 7).unwrap();
        let b = HnswIndex::with_seed(HnswConfig::default(), "euclidean", 7).unwrap();
        let seq_a: Vec<usize> = (0..64).map(|_| a.random_level()).collect();
        let seq_b: Vec<usize> = (0..64).map(|_| b.random_level()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_distance_to_unknown_id_is_infinite() {
        let index = HnswIndex::new(HnswConfig::default(), "euclidean").unwrap();
        assert_eq!(index.distance_to(&[1.0, 2.0], 99), f64::INFINITY);
    }

    #[test]
    fn test_remove_unknown_id() {
        let index = HnswIndex::new(HnswConfig::default(), "euclidean").unwrap();
        assert!(!index.remove(1));
    }
}
