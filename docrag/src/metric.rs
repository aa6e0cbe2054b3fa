//! Distance metrics used to rank stored embeddings against a query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Distance metric for similarity search. Lower distances are more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance, `1 - cos(a, b)`, in `[0, 2]`.
    #[default]
    Cosine,
    /// Euclidean (L2) distance.
    Euclidean,
}

impl DistanceMetric {
    /// Returns the pgvector operator for this metric.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Cosine => "<=>",
            Self::Euclidean => "<->",
        }
    }

    /// Distance between two equal-length vectors.
    ///
    /// Returns `None` when the distance is undefined, which only happens for
    /// cosine distance against a zero-magnitude vector.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Option<f32> {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => Some(euclidean_distance(a, b)),
        }
    }

    /// The lowercase name used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            other => Err(RagError::invalid(format!(
                "unknown distance metric '{other}' (expected 'cosine' or 'euclidean')"
            ))),
        }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    // Rounding can push the similarity slightly outside [-1, 1].
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    Some(1.0 - similarity)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}
