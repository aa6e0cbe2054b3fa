//! Embedding provider trait for generating vector embeddings from text.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// Embeddings keyed by the position of their input text in the request.
pub type IndexedEmbeddings = BTreeMap<usize, Vec<f32>>;

/// A provider that generates vector embeddings from text input.
///
/// Implementations return one vector per input, keyed by the input's
/// zero-based position, so callers can realign results with their inputs
/// regardless of the order the backend answers in.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world", 1536).await?;
/// assert_eq!(embedding.len(), 1536);
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings of length `dimensions` for a batch of texts.
    async fn embed_batch(&self, texts: &[&str], dimensions: usize) -> Result<IndexedEmbeddings>;

    /// Generate an embedding vector for a single text input.
    ///
    /// The default implementation sends a one-element batch and takes index 0.
    async fn embed(&self, text: &str, dimensions: usize) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text], dimensions).await?;
        let embedding = batch.remove(&0).ok_or_else(|| {
            RagError::embedding(self.name(), None, "response contained no embedding for index 0")
        })?;
        check_dimensions(&embedding, dimensions)?;
        Ok(embedding)
    }

    /// Provider name used in errors and logs.
    fn name(&self) -> &str;
}

/// Turn an index-keyed batch into a vector ordered like the original inputs.
///
/// # Errors
///
/// Returns [`RagError::EmbeddingService`] if any index in `0..expected` is
/// missing, and [`RagError::DimensionMismatch`] if any vector's length differs
/// from `dimensions`.
pub fn align_embeddings(
    provider: &str,
    mut batch: IndexedEmbeddings,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    (0..expected)
        .map(|index| {
            let embedding = batch.remove(&index).ok_or_else(|| {
                RagError::embedding(
                    provider,
                    None,
                    format!("response contained no embedding for index {index}"),
                )
            })?;
            check_dimensions(&embedding, dimensions)?;
            Ok(embedding)
        })
        .collect()
}

pub(crate) fn check_dimensions(embedding: &[f32], dimensions: usize) -> Result<()> {
    if embedding.len() != dimensions {
        return Err(RagError::DimensionMismatch { expected: dimensions, actual: embedding.len() });
    }
    Ok(())
}
