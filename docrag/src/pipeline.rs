//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates ingestion (read → chunk → embed → store)
//! and retrieval (embed → search → filter) by composing an
//! [`EmbeddingProvider`] and a [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new(1536)))
//!     .build()?;
//!
//! pipeline.ingest("microwave_manual.txt").await?;
//! let snippets = pipeline.retrieve("How do I set the clock?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::{IngestOptions, RagConfig, RetrievalOptions};
use crate::document::{Document, EmbeddedChunk, SearchResult};
use crate::embedding::{EmbeddingProvider, align_embeddings};
use crate::error::{RagError, Result};
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Name stored on every record of the document.
    pub document_name: String,
    /// Number of records inserted.
    pub chunk_count: usize,
}

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    retriever: Retriever,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Return the retriever used by [`retrieve`](Self::retrieve).
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Delete every record in the vector store's collection.
    pub async fn reset_collection(&self) -> Result<()> {
        self.vector_store.reset_collection().await.map_err(|e| {
            error!(error = %e, "failed to reset collection");
            e
        })
    }

    /// Ingest a text file using the configured [`IngestOptions`].
    pub async fn ingest(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
        self.ingest_with(path, &self.config.ingest).await
    }

    /// Ingest a UTF-8 text file. The document is named after the file's base name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the file cannot be read, plus every error
    /// [`ingest_document`](Self::ingest_document) can return.
    pub async fn ingest_with(
        &self,
        path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<IngestReport> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|source| {
            error!(path = %path.display(), error = %source, "failed to read document");
            RagError::Io { path: path.to_path_buf(), source }
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.ingest_document(&Document::new(name, text), options).await
    }

    /// Ingest a document: optionally reset → chunk → embed → store.
    ///
    /// Chunks are embedded in a single batch and realigned by index before
    /// insertion, so each record pairs a chunk with its own embedding.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] for bad options,
    /// [`RagError::DimensionMismatch`] if `options.dimensions` differs from the
    /// store's or the provider returns vectors of the wrong length, and any
    /// embedding or store error unchanged.
    pub async fn ingest_document(
        &self,
        document: &Document,
        options: &IngestOptions,
    ) -> Result<IngestReport> {
        let chunker = options.chunker()?;
        let store_dimensions = self.vector_store.dimensions();
        if options.dimensions != store_dimensions {
            return Err(RagError::DimensionMismatch {
                expected: store_dimensions,
                actual: options.dimensions,
            });
        }

        if options.reset_first {
            self.reset_collection().await?;
        }

        // 1. Chunk the document
        let chunks = chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.name = %document.name, chunk_count = 0, "ingested document (empty)");
            return Ok(IngestReport { document_name: document.name.clone(), chunk_count: 0 });
        }

        // 2. Generate embeddings for all chunk texts in one batch
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let provider = self.embedding_provider.name();
        let embeddings = self
            .embedding_provider
            .embed_batch(&texts, options.dimensions)
            .await
            .and_then(|batch| align_embeddings(provider, batch, texts.len(), options.dimensions))
            .map_err(|e| {
                error!(
                    document.name = %document.name,
                    error = %e,
                    "embedding failed during ingestion"
                );
                e
            })?;

        // 3. Pair each chunk with the embedding computed at its position
        let records: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { text: chunk.text, embedding })
            .collect();

        // 4. Insert into the vector store
        self.vector_store.bulk_insert(&document.name, &records).await.map_err(|e| {
            error!(document.name = %document.name, error = %e, "insert failed during ingestion");
            e
        })?;

        let chunk_count = records.len();
        info!(document.name = %document.name, chunk_count, "ingested document");

        Ok(IngestReport { document_name: document.name.clone(), chunk_count })
    }

    /// Retrieve context snippets using the configured [`RetrievalOptions`].
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        self.retrieve_with(query, &self.config.retrieval).await
    }

    /// Retrieve context snippets, most similar first.
    pub async fn retrieve_with(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<String>> {
        self.retriever.retrieve(query, options.metric, options.top_k, options.min_score).await
    }

    /// Search with explicit options, keeping distances.
    pub async fn search(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<SearchResult>> {
        self.retriever.search(query, options).await
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if any field is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.ok_or_else(|| RagError::invalid("config is required"))?;
        config.ingest.validate()?;
        config.retrieval.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::invalid("embedding_provider is required"))?;
        let vector_store =
            self.vector_store.ok_or_else(|| RagError::invalid("vector_store is required"))?;

        let retriever = Retriever::new(embedding_provider.clone(), vector_store.clone());
        Ok(RagPipeline { config, embedding_provider, vector_store, retriever })
    }
}
