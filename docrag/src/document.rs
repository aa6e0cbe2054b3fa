//! Data types for documents, chunks, stored records, and search results.

use serde::{Deserialize, Serialize};

/// A source document to be chunked and ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Name recorded on every stored chunk, usually the file's base name.
    pub name: String,
    /// The text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document from a name and its text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// A window of a [`Document`]'s text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The name of the parent [`Document`].
    pub document_name: String,
    /// Zero-based ordinal of this window within the document.
    pub index: usize,
    /// The text content of the window.
    pub text: String,
}

/// A chunk's text paired with the embedding computed for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// The chunk text.
    pub text: String,
    /// The embedding for `text`.
    pub embedding: Vec<f32>,
}

impl EmbeddedChunk {
    /// Pair a chunk text with its embedding.
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self { text: text.into(), embedding }
    }
}

/// A persisted `{document_name, text, embedding}` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    /// The document the text came from.
    pub document_name: String,
    /// The chunk text.
    pub text: String,
    /// The chunk embedding.
    pub embedding: Vec<f32>,
}

/// A chunk text returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The stored chunk text.
    pub text: String,
    /// Distance to the query (lower is more similar).
    pub distance: f32,
}
