//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{EmbeddedChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::metric::DistanceMetric;

/// A storage backend for chunk embeddings with similarity search.
///
/// A store owns a single collection of fixed dimensionality. Records are
/// bulk-inserted during ingestion and only ever removed all at once by
/// [`reset_collection`](VectorStore::reset_collection).
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{DistanceMetric, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(1536);
/// store.bulk_insert("manual.txt", &chunks).await?;
/// let results = store.search(&query_embedding, DistanceMetric::Cosine, 5, 0.5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Dimensionality every stored and query embedding must have.
    fn dimensions(&self) -> usize;

    /// Delete every record in the collection.
    async fn reset_collection(&self) -> Result<()>;

    /// Insert one record per chunk, in order, all tagged with `document_name`.
    ///
    /// Every embedding must have [`dimensions`](VectorStore::dimensions)
    /// entries; otherwise nothing is inserted.
    async fn bulk_insert(&self, document_name: &str, chunks: &[EmbeddedChunk]) -> Result<()>;

    /// Return at most `top_k` records whose distance to `embedding` is
    /// strictly less than `min_score`, ordered by ascending distance with
    /// ties in insertion order.
    async fn search(
        &self,
        embedding: &[f32],
        metric: DistanceMetric,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize>;
}

/// Validate search parameters shared by every backend.
///
/// # Errors
///
/// Returns [`RagError::InvalidConfiguration`] if `top_k` is zero or
/// `min_score` is not a finite number greater than zero, and
/// [`RagError::DimensionMismatch`] if the query has the wrong length.
pub fn validate_search(
    embedding: &[f32],
    dimensions: usize,
    top_k: usize,
    min_score: f32,
) -> Result<()> {
    validate_limits(top_k, min_score)?;
    if embedding.len() != dimensions {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: embedding.len() });
    }
    Ok(())
}

/// `top_k` must be positive and `min_score` a finite number greater than zero.
pub(crate) fn validate_limits(top_k: usize, min_score: f32) -> Result<()> {
    if top_k == 0 {
        return Err(RagError::invalid("top_k must be greater than zero"));
    }
    if !min_score.is_finite() || min_score <= 0.0 {
        return Err(RagError::invalid(format!(
            "min_score ({min_score}) must be a finite number greater than zero"
        )));
    }
    Ok(())
}

/// Check every chunk's embedding length before anything is written.
pub fn validate_chunks(chunks: &[EmbeddedChunk], dimensions: usize) -> Result<()> {
    match chunks.iter().find(|c| c.embedding.len() != dimensions) {
        Some(bad) => {
            Err(RagError::DimensionMismatch { expected: dimensions, actual: bad.embedding.len() })
        }
        None => Ok(()),
    }
}
