//! Distance metric implementations for HNSW search.
//!
//! Four named metrics: euclidean, manhattan, cosine, and dot product. All
//! are pure functions of two f64 slices where **lower is better** (more
//! similar). Vectors of unequal length are never an error here: every
//! metric maps them to `f64::INFINITY`, which is the only dimension check
//! the index performs.

use crate::error::HnswError;
use serde::{Deserialize, Serialize};

/// Distance metric used for vector similarity computation.
///
/// Resolved by string identifier at index construction; see [`DistanceMetric::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance: `sqrt(Σ(aᵢ−bᵢ)²)`. Range: \[0, ∞).
    Euclidean,
    /// Manhattan (L1) distance: `Σ|aᵢ−bᵢ|`. Range: \[0, ∞).
    Manhattan,
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    /// Infinite when either vector has zero norm.
    Cosine,
    /// Negative dot product: `-(a·b)`. Lower = higher similarity. Signed.
    Dot,
}

impl DistanceMetric {
    /// Resolves a metric by its string identifier: `"euclidean"`,
    /// `"manhattan"`, `"cosine"`, or `"dot"`.
    ///
    /// Unknown identifiers fail here, at index construction, never during
    /// queries.
    pub fn from_name(name: &str) -> Result<Self, HnswError> {
        match name {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "manhattan" => Ok(DistanceMetric::Manhattan),
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" => Ok(DistanceMetric::Dot),
            other => Err(HnswError::UnknownMetric(other.to_string())),
        }
    }

    /// The identifier accepted by [`DistanceMetric::from_name`].
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Dot => "dot",
        }
    }

    /// Computes the distance between two vectors.
    ///
    /// Mismatched lengths return `f64::INFINITY`.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        if a.len() != b.len() {
            return f64::INFINITY;
        }
        match self {
            DistanceMetric::Euclidean => euclidean(a, b),
            DistanceMetric::Manhattan => manhattan(a, b),
            DistanceMetric::Cosine => cosine(a, b),
            DistanceMetric::Dot => -dot(a, b),
        }
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return f64::INFINITY;
    }
    // Clamp: rounding can push the ratio past 1 for near-parallel vectors.
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).min(1.0);
    1.0 - similarity
}
