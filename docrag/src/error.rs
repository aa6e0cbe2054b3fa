//! Error types for the `docrag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A chunking, search or builder parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding service failed or returned an unusable response.
    #[error(
        "Embedding service error ({provider}){}: {message}",
        .status.map(|s| format!(" [HTTP {s}]")).unwrap_or_default()
    )]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// The HTTP status code, when the failure came from a response.
        status: Option<u16>,
        /// A description of the failure.
        message: String,
        /// Whether retrying the same request may succeed.
        transient: bool,
    },

    /// A vector's length does not match the collection's dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the collection.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// The vector store backend could not be reached.
    #[error("Vector store connection error ({backend}): {message}")]
    StoreConnection {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A statement against the vector store backend failed.
    #[error("Vector store query error ({backend}): {message}")]
    StoreQuery {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The source document could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RagError {
    /// Shorthand for an [`RagError::InvalidConfiguration`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// An embedding failure reported by the service or found in its response.
    ///
    /// Only HTTP 429 and 5xx statuses are transient.
    pub fn embedding(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::EmbeddingService {
            provider: provider.into(),
            status,
            message: message.into(),
            transient: status.is_some_and(|s| s == 429 || s >= 500),
        }
    }

    /// An embedding request that never got a response (connect error, timeout).
    pub fn embedding_transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingService {
            provider: provider.into(),
            status: None,
            message: message.into(),
            transient: true,
        }
    }

    /// Returns true when the error came from an unreachable backend, a
    /// transport-level embedding failure or a throttled/unavailable service.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::StoreConnection { .. } => true,
            Self::EmbeddingService { transient, .. } => *transient,
            _ => false,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
