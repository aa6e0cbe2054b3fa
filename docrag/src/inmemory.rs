//! In-memory vector store with cosine and Euclidean search.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `Vec` of records protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small documents.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{EmbeddedChunk, SearchResult, StoredRecord};
use crate::error::Result;
use crate::metric::DistanceMetric;
use crate::vectorstore::{VectorStore, validate_chunks, validate_search};

/// An in-memory [`VectorStore`] holding records in insertion order.
///
/// Search is a full scan. Records whose cosine distance to the query is
/// undefined (zero-magnitude vectors) never match.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(384);
/// store.bulk_insert("doc.txt", &chunks).await?;
/// ```
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimensions: usize,
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store for embeddings of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, records: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn reset_collection(&self) -> Result<()> {
        let mut records = self.records.write().await;
        let removed = records.len();
        records.clear();
        debug!(backend = "in_memory", removed, "reset collection");
        Ok(())
    }

    async fn bulk_insert(&self, document_name: &str, chunks: &[EmbeddedChunk]) -> Result<()> {
        validate_chunks(chunks, self.dimensions)?;

        let mut records = self.records.write().await;
        records.extend(chunks.iter().map(|chunk| StoredRecord {
            document_name: document_name.to_string(),
            text: chunk.text.clone(),
            embedding: chunk.embedding.clone(),
        }));

        debug!(backend = "in_memory", document_name, count = chunks.len(), "inserted chunks");
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        metric: DistanceMetric,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        validate_search(embedding, self.dimensions, top_k, min_score)?;

        let records = self.records.read().await;
        let mut scored: Vec<SearchResult> = records
            .iter()
            .filter_map(|record| {
                let distance = metric.distance(&record.embedding, embedding)?;
                (distance < min_score)
                    .then(|| SearchResult { text: record.text.clone(), distance })
            })
            .collect();

        // `sort_by` is stable, so equal distances keep insertion order.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);

        debug!(
            backend = "in_memory",
            %metric,
            top_k,
            min_score,
            result_count = scored.len(),
            "searched"
        );
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;

    fn sample_chunks() -> Vec<EmbeddedChunk> {
        vec![
            EmbeddedChunk::new("x-axis", vec![1.0, 0.0]),
            EmbeddedChunk::new("y-axis", vec![0.0, 1.0]),
            EmbeddedChunk::new("diagonal", vec![1.0, 1.0]),
        ]
    }

    #[tokio::test]
    async fn cosine_search_filters_and_ranks() {
        let store = InMemoryVectorStore::new(2);
        store.bulk_insert("axes.txt", &sample_chunks()).await.unwrap();

        let results = store.search(&[1.0, 0.0], DistanceMetric::Cosine, 2, 0.5).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["x-axis", "diagonal"]);
        assert!(results[0].distance.abs() < 1e-6);
        assert!((results[1].distance - (1.0 - std::f32::consts::FRAC_1_SQRT_2)).abs() < 1e-5);
    }

    #[tokio::test]
    async fn euclidean_search_ranks_by_l2_distance() {
        let store = InMemoryVectorStore::new(2);
        store.bulk_insert("axes.txt", &sample_chunks()).await.unwrap();

        let results =
            store.search(&[1.0, 0.0], DistanceMetric::Euclidean, 3, 1.2).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        // y-axis is sqrt(2) away and falls outside the threshold.
        assert_eq!(texts, ["x-axis", "diagonal"]);
        assert!((results[1].distance - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new(2);
        let chunks = vec![
            EmbeddedChunk::new("first", vec![0.0, 1.0]),
            EmbeddedChunk::new("second", vec![0.0, 2.0]),
            EmbeddedChunk::new("third", vec![0.0, 3.0]),
        ];
        store.bulk_insert("ties.txt", &chunks).await.unwrap();

        let results = store.search(&[0.0, 1.0], DistanceMetric::Cosine, 3, 0.5).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn reset_then_search_returns_empty() {
        let store = InMemoryVectorStore::new(2);
        store.bulk_insert("axes.txt", &sample_chunks()).await.unwrap();
        store.reset_collection().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        let results = store.search(&[1.0, 0.0], DistanceMetric::Cosine, 5, 2.0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn mismatched_insert_writes_nothing() {
        let store = InMemoryVectorStore::new(2);
        let chunks = vec![
            EmbeddedChunk::new("ok", vec![1.0, 0.0]),
            EmbeddedChunk::new("bad", vec![1.0, 0.0, 0.0]),
        ];

        let err = store.bulk_insert("bad.txt", &chunks).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mismatched_query_is_rejected() {
        let store = InMemoryVectorStore::new(2);
        store.bulk_insert("axes.txt", &sample_chunks()).await.unwrap();

        let err = store.search(&[1.0], DistanceMetric::Cosine, 5, 0.5).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[tokio::test]
    async fn zero_vectors_never_match_under_cosine() {
        let store = InMemoryVectorStore::new(2);
        store.bulk_insert("zero.txt", &[EmbeddedChunk::new("zero", vec![0.0, 0.0])]).await.unwrap();

        let results = store.search(&[1.0, 0.0], DistanceMetric::Cosine, 5, 2.0).await.unwrap();
        assert!(results.is_empty());
    }
}
