//! Configuration for ingestion and retrieval.

use serde::{Deserialize, Serialize};

use crate::chunking::FixedSizeChunker;
use crate::error::{RagError, Result};
use crate::metric::DistanceMetric;
use crate::vectorstore::validate_limits;

/// Parameters for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestOptions {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive windows.
    pub chunk_overlap: usize,
    /// Embedding dimensionality requested from the provider.
    pub dimensions: usize,
    /// Clear the collection before inserting.
    pub reset_first: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { chunk_size: 300, chunk_overlap: 40, dimensions: 1536, reset_first: true }
    }
}

impl IngestOptions {
    /// Check that the options describe a terminating, non-empty chunking.
    pub fn validate(&self) -> Result<()> {
        self.chunker().map(|_| ())
    }

    /// Validate the options and build the chunker they describe.
    pub fn chunker(&self) -> Result<FixedSizeChunker> {
        if self.dimensions == 0 {
            return Err(RagError::invalid("dimensions must be greater than zero"));
        }
        FixedSizeChunker::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Parameters for one similarity query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalOptions {
    /// Distance metric used for ranking.
    pub metric: DistanceMetric,
    /// Maximum number of snippets to return.
    pub top_k: usize,
    /// Exclusive upper bound on accepted distance.
    pub min_score: f32,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { metric: DistanceMetric::Cosine, top_k: 5, min_score: 0.5 }
    }
}

impl RetrievalOptions {
    /// Check `top_k` and `min_score` ranges.
    pub fn validate(&self) -> Result<()> {
        validate_limits(self.top_k, self.min_score)
    }
}

/// Default ingestion and retrieval parameters for a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Defaults for [`RagPipeline::ingest`](crate::RagPipeline::ingest).
    pub ingest: IngestOptions,
    /// Defaults for [`RagPipeline::retrieve`](crate::RagPipeline::retrieve).
    pub retrieval: RetrievalOptions,
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the window size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.ingest.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive windows in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.ingest.chunk_overlap = overlap;
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.ingest.dimensions = dimensions;
        self
    }

    /// Set whether ingestion clears the collection first.
    pub fn reset_first(mut self, reset: bool) -> Self {
        self.config.ingest.reset_first = reset;
        self
    }

    /// Set the distance metric.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.retrieval.metric = metric;
        self
    }

    /// Set the number of snippets to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.retrieval.top_k = k;
        self
    }

    /// Set the exclusive distance threshold.
    pub fn min_score(mut self, min_score: f32) -> Self {
        self.config.retrieval.min_score = min_score;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `dimensions == 0`
    /// - `top_k == 0`
    /// - `min_score` is not a finite number greater than zero
    pub fn build(self) -> Result<RagConfig> {
        self.config.ingest.validate()?;
        self.config.retrieval.validate()?;
        Ok(self.config)
    }
}
