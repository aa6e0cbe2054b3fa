//! Query-time retrieval: embed the query, search the store, keep the text.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::RetrievalOptions;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::metric::DistanceMetric;
use crate::vectorstore::VectorStore;

/// Turns a user query into ranked context snippets.
///
/// The retriever only reads from the store. Errors from the embedding
/// provider or the store are returned unchanged and never retried.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a retriever over the given provider and store.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self { embedding_provider, vector_store }
    }

    /// Return the texts of the closest stored chunks, most similar first.
    ///
    /// An empty `Vec` means nothing was closer than `min_score`.
    pub async fn retrieve(
        &self,
        query: &str,
        metric: DistanceMetric,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<String>> {
        let options = RetrievalOptions { metric, top_k, min_score };
        let results = self.search(query, &options).await?;
        Ok(results.into_iter().map(|r| r.text).collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps each snippet's distance.
    pub async fn search(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<SearchResult>> {
        // Reject bad limits before paying for an embedding call.
        options.validate()?;

        let dimensions = self.vector_store.dimensions();
        debug!(query_len = query.len(), dimensions, "embedding query");

        let query_embedding =
            self.embedding_provider.embed(query, dimensions).await.map_err(|e| {
                error!(
                    provider = self.embedding_provider.name(),
                    error = %e,
                    "query embedding failed"
                );
                e
            })?;

        let results = self
            .vector_store
            .search(&query_embedding, options.metric, options.top_k, options.min_score)
            .await
            .map_err(|e| {
                error!(metric = %options.metric, error = %e, "vector store search failed");
                e
            })?;

        info!(
            metric = %options.metric,
            top_k = options.top_k,
            min_score = options.min_score,
            result_count = results.len(),
            "query completed"
        );
        Ok(results)
    }
}
