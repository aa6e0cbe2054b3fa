//! Document retrieval for grounding LLM chat responses.
//!
//! This crate provides:
//! - Fixed-size character chunking with overlap
//! - An embedding provider trait, with an OpenAI-compatible client (`openai` feature)
//! - A vector store trait with in-memory and pgvector (`pgvector` feature) backends
//! - Cosine and Euclidean similarity search with `top_k` and distance threshold
//! - An ingest/retrieve pipeline and prompt augmentation helpers

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod metric;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;

pub use chunking::{Chunker, FixedSizeChunker, chunk_text};
pub use config::{IngestOptions, RagConfig, RagConfigBuilder, RetrievalOptions};
pub use document::{Chunk, Document, EmbeddedChunk, SearchResult, StoredRecord};
pub use embedding::{EmbeddingProvider, IndexedEmbeddings, align_embeddings};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use metric::DistanceMetric;
pub use pipeline::{IngestReport, RagPipeline, RagPipelineBuilder};
pub use retriever::Retriever;
pub use vectorstore::VectorStore;
